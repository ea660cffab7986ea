use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{participant_entity, prize_entity};

use super::PaginatedResponse;

/// 资格校验请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct VerifyRequest {
    /// 扫码或手动输入的二维码内容
    pub qr_code: String,
}

/// 资格校验响应
/// - valid: 二维码是否为已注册的有效码
/// - eligible: 是否还有抽奖资格 (无参与记录)
/// - claimed: 已有参与记录时是否已领取
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    pub valid: bool,
    pub eligible: bool,
    pub claimed: bool,
    pub message: String,
}

/// 抽奖请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SpinRequest {
    pub qr_code: String,
}

/// 抽奖响应
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SpinResponse {
    /// 中奖奖品名称
    pub prize: String,
}

/// 领奖请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ClaimRequest {
    pub qr_code: String,
}

/// 领奖响应 (幂等: 重复领取返回同样结果)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClaimResponse {
    pub claimed: bool,
    /// 该二维码中奖的奖品名称
    pub prize: String,
}

/// 奖品基础信息（转盘扇区展示用）
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrizeResponse {
    pub id: i64,
    pub name: String,
    /// 相对概率权重
    pub weight: i32,
    /// 剩余库存
    pub remaining_count: i64,
    pub is_active: bool,
}

impl From<prize_entity::Model> for PrizeResponse {
    fn from(m: prize_entity::Model) -> Self {
        PrizeResponse {
            id: m.id,
            name: m.name,
            weight: m.weight,
            remaining_count: m.remaining_count,
            is_active: m.is_active,
        }
    }
}

/// 参与记录查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RecordQuery {
    /// 页码 (默认 1)
    pub page: Option<u32>,
    /// 每页数量 (默认 20)
    pub per_page: Option<u32>,
}

/// 参与记录响应 (运营查询用)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParticipantRecordResponse {
    pub id: i64,
    pub qr_code: String,
    /// 中奖奖品名称 (历史快照)
    pub prize_name: String,
    pub claimed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<participant_entity::Model> for ParticipantRecordResponse {
    fn from(m: participant_entity::Model) -> Self {
        ParticipantRecordResponse {
            id: m.id,
            qr_code: m.qr_code,
            prize_name: m.prize_name,
            claimed: m.claimed,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// 参与记录分页响应
pub type ParticipantRecordPageResponse = PaginatedResponse<ParticipantRecordResponse>;
