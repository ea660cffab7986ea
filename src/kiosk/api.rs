use crate::error::{AppError, AppResult};
use crate::models::{
    ApiError, ApiResponse, ClaimRequest, ClaimResponse, PrizeResponse, SpinRequest, SpinResponse,
    VerifyRequest, VerifyResponse,
};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// 摊位机器访问服务端的 HTTP 客户端。
/// 响应统一为 `{success, data | error}` 信封, 业务错误还原为对应的 AppError。
pub struct KioskApi {
    client: Client,
    base_url: String,
}

impl KioskApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn verify(&self, qr_code: &str) -> AppResult<VerifyResponse> {
        self.post(
            "/api/v1/participation/verify",
            &VerifyRequest {
                qr_code: qr_code.to_string(),
            },
        )
        .await
    }

    pub async fn spin(&self, qr_code: &str) -> AppResult<SpinResponse> {
        self.post(
            "/api/v1/participation/spin",
            &SpinRequest {
                qr_code: qr_code.to_string(),
            },
        )
        .await
    }

    pub async fn claim(&self, qr_code: &str) -> AppResult<ClaimResponse> {
        self.post(
            "/api/v1/participation/claim",
            &ClaimRequest {
                qr_code: qr_code.to_string(),
            },
        )
        .await
    }

    pub async fn prizes(&self) -> AppResult<Vec<PrizeResponse>> {
        let url = format!("{}/api/v1/participation/prizes", self.base_url);
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> AppResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(body).send().await?;
        decode(response).await
    }
}

/// 拆开响应信封: 成功取 data, 失败把错误码还原为 AppError
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
    let envelope: ApiResponse<T> = response.json().await?;
    if envelope.success {
        envelope
            .data
            .ok_or_else(|| AppError::InternalError("Response data missing".to_string()))
    } else {
        let err = envelope.error.unwrap_or(ApiError {
            code: "INTERNAL_ERROR".to_string(),
            message: "Unknown server error".to_string(),
        });
        Err(map_api_error(err))
    }
}

fn map_api_error(err: ApiError) -> AppError {
    match err.code.as_str() {
        "INVALID_INPUT" => AppError::ValidationError(err.message),
        "NOT_FOUND" => AppError::NotFound(err.message),
        "ALREADY_PARTICIPATED" => AppError::AlreadyParticipated,
        "NO_PRIZES_AVAILABLE" => AppError::NoPrizesAvailable,
        "ALLOCATION_CONFLICT" => AppError::AllocationConflict,
        _ => AppError::InternalError(err.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: &str) -> ApiError {
        ApiError {
            code: code.to_string(),
            message: "msg".to_string(),
        }
    }

    #[test]
    fn test_map_api_error_codes() {
        assert!(matches!(
            map_api_error(api_error("ALREADY_PARTICIPATED")),
            AppError::AlreadyParticipated
        ));
        assert!(matches!(
            map_api_error(api_error("NO_PRIZES_AVAILABLE")),
            AppError::NoPrizesAvailable
        ));
        assert!(matches!(
            map_api_error(api_error("ALLOCATION_CONFLICT")),
            AppError::AllocationConflict
        ));
        assert!(matches!(
            map_api_error(api_error("NOT_FOUND")),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            map_api_error(api_error("INVALID_INPUT")),
            AppError::ValidationError(_)
        ));
        assert!(matches!(
            map_api_error(api_error("SOMETHING_ELSE")),
            AppError::InternalError(_)
        ));
    }

    #[test]
    fn test_envelope_round_trip() {
        let json = r#"{"success":true,"data":{"prize":"10% Off"}}"#;
        let envelope: ApiResponse<SpinResponse> = serde_json::from_str(json).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data.unwrap().prize, "10% Off");

        let json = r#"{"success":false,"error":{"code":"ALREADY_PARTICIPATED","message":"nope"}}"#;
        let envelope: ApiResponse<SpinResponse> = serde_json::from_str(json).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.error.unwrap().code, "ALREADY_PARTICIPATED");
    }
}
