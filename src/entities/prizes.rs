use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 转盘奖品配置实体
/// 概念说明:
/// - weight: 相对概率权重 (正整数), 中奖概率 = weight / 启用奖品权重之和
/// - remaining_count: 剩余库存 (>= 0), 扣减到 0 后不再参与抽取
/// - is_active: 是否启用 (下线的奖品保留配置但不参与抽取)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "prizes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// 奖品名称 (唯一)
    pub name: String,
    /// 相对概率权重
    pub weight: i32,
    /// 剩余库存
    pub remaining_count: i64,
    /// 是否启用
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// 是否可参与抽取 (启用且有库存)
    pub fn is_available(&self) -> bool {
        self.is_active && self.remaining_count > 0
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
