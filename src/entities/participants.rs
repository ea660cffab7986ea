use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 参与记录实体
/// 说明:
/// - qr_code 唯一: 同一二维码只允许一次抽奖, 唯一索引是并发下的最终裁决
/// - prize_name 冗余存储奖品名称快照 (奖品配置后续修改或下线仍可回溯)
/// - claimed: 是否已在摊位领取实物
/// - ip_address: 抽奖请求来源 IP (现场排查重复刷码用)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "participants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// 二维码内容 (唯一)
    pub qr_code: String,
    /// 中奖奖品名称 (历史快照)
    pub prize_name: String,
    /// 是否已领取
    pub claimed: bool,
    /// 来源 IP
    pub ip_address: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
