use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ApiResponse;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("You have already participated in the wheel spin")]
    AlreadyParticipated,

    #[error("No prizes available")]
    NoPrizesAvailable,

    #[error("Allocation conflict, please verify your code again")]
    AllocationConflict,

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message): (StatusCode, &str, String) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::AlreadyParticipated => (
                StatusCode::CONFLICT,
                "ALREADY_PARTICIPATED",
                self.to_string(),
            ),
            AppError::NoPrizesAvailable => {
                // 库存耗尽需要运营人员补货, 保留告警日志
                log::warn!("Prize inventory exhausted");
                (
                    StatusCode::CONFLICT,
                    "NO_PRIZES_AVAILABLE",
                    self.to_string(),
                )
            }
            AppError::AllocationConflict => {
                log::warn!("Allocation conflict detected");
                (
                    StatusCode::CONFLICT,
                    "ALLOCATION_CONFLICT",
                    self.to_string(),
                )
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        HttpResponse::build(status_code).json(ApiResponse::<()>::error(
            error_code.to_string(),
            message,
        ))
    }
}
