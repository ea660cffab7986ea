use crate::entities::{
    participant_entity as participants, prize_entity as prizes,
    registration_entity as registrations,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    ClaimResponse, PaginatedResponse, PaginationParams, ParticipantRecordPageResponse,
    ParticipantRecordResponse, PrizeResponse, RecordQuery, SpinResponse, VerifyResponse,
};
use chrono::Utc;
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait, UpdateResult,
};

#[derive(Clone)]
pub struct ParticipationService {
    pool: DatabaseConnection,
}

impl ParticipationService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 资格校验 (Verify)
    ///
    /// 逻辑:
    /// 1. 二维码必须预注册, 否则 valid = false
    /// 2. 无参与记录 -> eligible = true
    /// 3. 已有参与记录 -> eligible = false, claimed 返回记录上的领取状态
    ///
    /// 无副作用, 可重复调用。
    pub async fn verify(&self, qr_code: &str) -> AppResult<VerifyResponse> {
        let qr_code = normalize_qr_code(qr_code)?;

        let registration = registrations::Entity::find()
            .filter(registrations::Column::QrCode.eq(qr_code))
            .one(&self.pool)
            .await?;

        if registration.is_none() {
            return Ok(VerifyResponse {
                valid: false,
                eligible: false,
                claimed: false,
                message: "Invalid QR code".to_string(),
            });
        }

        let participant = participants::Entity::find()
            .filter(participants::Column::QrCode.eq(qr_code))
            .one(&self.pool)
            .await?;

        match participant {
            None => Ok(VerifyResponse {
                valid: true,
                eligible: true,
                claimed: false,
                message: "You are eligible to spin the wheel!".to_string(),
            }),
            Some(p) => Ok(VerifyResponse {
                valid: true,
                eligible: false,
                claimed: p.claimed,
                message: "You have already participated".to_string(),
            }),
        }
    }

    /// 抽奖 (Spin)
    ///
    /// 逻辑 (全部在同一事务内):
    /// 1. 服务端重新校验注册与参与状态 (不信任客户端状态机)
    /// 2. 读取启用且有库存的奖品, 固定按 id 升序
    /// 3. 按权重随机抽取
    /// 4. 原子扣减库存 (update where remaining_count > 0), 失败则剔除该奖品重抽
    /// 5. 写参与记录; qr_code 唯一索引拦截并发重复请求
    /// 6. 提交事务并返回奖品名称
    ///
    /// 第 5 步唯一约束冲突时事务未提交即回滚, 第 4 步的扣减一并撤销,
    /// 不会出现扣了库存却没有中奖记录的情况。
    pub async fn spin(&self, qr_code: &str, ip_address: Option<String>) -> AppResult<SpinResponse> {
        let qr_code = normalize_qr_code(qr_code)?;

        let txn = self.pool.begin().await?;

        let registration = registrations::Entity::find()
            .filter(registrations::Column::QrCode.eq(qr_code))
            .one(&txn)
            .await?;
        if registration.is_none() {
            return Err(AppError::NotFound("QR code is not registered".to_string()));
        }

        let existing = participants::Entity::find()
            .filter(participants::Column::QrCode.eq(qr_code))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(AppError::AlreadyParticipated);
        }

        let prize_list = prizes::Entity::find()
            .filter(prizes::Column::IsActive.eq(true))
            .filter(prizes::Column::RemainingCount.gt(0))
            .order_by_asc(prizes::Column::Id)
            .all(&txn)
            .await?;

        if prize_list.is_empty() {
            return Err(AppError::NoPrizesAvailable);
        }

        let selected = self.select_and_secure_prize(&txn, prize_list).await?;

        let insert = participants::ActiveModel {
            qr_code: Set(qr_code.to_string()),
            prize_name: Set(selected.name.clone()),
            claimed: Set(false),
            ip_address: Set(ip_address),
            created_at: Set(Some(Utc::now())),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&txn)
        .await;

        if let Err(err) = insert {
            // 唯一约束冲突: 另一个并发请求已为该码写入记录
            return match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(AppError::AllocationConflict),
                _ => Err(err.into()),
            };
        }

        txn.commit().await?;

        Ok(SpinResponse {
            prize: selected.name,
        })
    }

    /// 领奖 (Claim), 幂等
    ///
    /// 把参与记录标记为已领取; 已领取的记录重复调用直接成功返回。
    pub async fn claim(&self, qr_code: &str) -> AppResult<ClaimResponse> {
        let qr_code = normalize_qr_code(qr_code)?;

        let participant = participants::Entity::find()
            .filter(participants::Column::QrCode.eq(qr_code))
            .one(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("No participation record for this QR code".to_string())
            })?;

        if participant.claimed {
            return Ok(ClaimResponse {
                claimed: true,
                prize: participant.prize_name,
            });
        }

        let prize = participant.prize_name.clone();
        let mut am = participant.into_active_model();
        am.claimed = Set(true);
        am.updated_at = Set(Some(Utc::now()));
        am.update(&self.pool).await?;

        Ok(ClaimResponse {
            claimed: true,
            prize,
        })
    }

    /// 获取奖品列表（仅启用的, 转盘扇区展示用）
    pub async fn list_prizes(&self) -> AppResult<Vec<PrizeResponse>> {
        let list = prizes::Entity::find()
            .filter(prizes::Column::IsActive.eq(true))
            .order_by_asc(prizes::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// 获取参与记录（分页, 倒序）
    pub async fn list_records(&self, query: &RecordQuery) -> AppResult<ParticipantRecordPageResponse> {
        let params = PaginationParams::new(query.page, query.per_page);
        let offset = params.get_offset();
        let limit = params.get_limit();

        let total = participants::Entity::find().count(&self.pool).await? as i64;

        let items_models = participants::Entity::find()
            .order_by(participants::Column::CreatedAt, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(&self.pool)
            .await?;

        let items: Vec<ParticipantRecordResponse> =
            items_models.into_iter().map(Into::into).collect();

        Ok(PaginatedResponse::new(
            items,
            params.page.unwrap_or(1),
            params.page_size.unwrap_or(20),
            total,
        ))
    }

    /// 选择并扣减库存, 某个奖品并发扣减失败时剔除后重抽。
    async fn select_and_secure_prize(
        &self,
        txn: &DatabaseTransaction,
        available: Vec<prizes::Model>,
    ) -> AppResult<prizes::Model> {
        let mut filtered = available;
        let mut attempts = 0;

        while attempts < 5 {
            attempts += 1;

            let total_weight: i32 = filtered.iter().map(|p| p.weight).sum();
            if total_weight <= 0 {
                // 奖品配置错误 (权重必须为正)
                return Err(AppError::InternalError("Total prize weight <= 0".to_string()));
            }

            let roll = rand::thread_rng().gen_range(0..total_weight);
            let chosen = pick_prize(&filtered, roll).clone();

            // 原子扣减: 仅在剩余库存 > 0 时生效
            let update_result: UpdateResult = prizes::Entity::update_many()
                .col_expr(
                    prizes::Column::RemainingCount,
                    Expr::col(prizes::Column::RemainingCount).sub(1),
                )
                .filter(prizes::Column::Id.eq(chosen.id))
                .filter(prizes::Column::RemainingCount.gt(0))
                .exec(txn)
                .await?;

            if update_result.rows_affected == 1 {
                return Ok(chosen);
            }

            // 扣减失败 - 该奖品库存已被并发耗尽, 剔除后重抽
            filtered.retain(|p| p.id != chosen.id);
            if filtered.is_empty() {
                return Err(AppError::NoPrizesAvailable);
            }
        }

        Err(AppError::AllocationConflict)
    }
}

/// 二维码输入校验: 去除首尾空白, 空串视为非法输入
fn normalize_qr_code(qr_code: &str) -> AppResult<&str> {
    let trimmed = qr_code.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError("QR code is required".to_string()));
    }
    Ok(trimmed)
}

/// 加权抽取: roll 取自 [0, 总权重), 按固定顺序累加权重,
/// 第一个使 roll < 累计权重的奖品中奖。
/// 边界平局固定偏向顺序靠前的奖品, 给定 roll 时结果完全确定。
fn pick_prize(prizes: &[prizes::Model], roll: i32) -> &prizes::Model {
    let mut acc = 0;
    for p in prizes {
        acc += p.weight;
        if roll < acc {
            return p;
        }
    }
    // roll 超界时回退到最后一项 (调用方保证 roll < 总权重, 正常不会走到)
    prizes.last().expect("non-empty prize list")
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};

    fn test_prize(id: i64, name: &str, weight: i32) -> prizes::Model {
        prizes::Model {
            id,
            name: name.to_string(),
            weight,
            remaining_count: 1,
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_pick_prize_tie_break_favors_earlier() {
        let list = vec![test_prize(1, "A", 1), test_prize(2, "B", 3)];
        // roll=0 落在 A 的区间 [0,1), 其余落在 B 的区间 [1,4)
        assert_eq!(pick_prize(&list, 0).name, "A");
        assert_eq!(pick_prize(&list, 1).name, "B");
        assert_eq!(pick_prize(&list, 2).name, "B");
        assert_eq!(pick_prize(&list, 3).name, "B");
    }

    #[test]
    fn test_pick_prize_equal_weights_boundary() {
        let list = vec![test_prize(1, "A", 2), test_prize(2, "B", 2)];
        assert_eq!(pick_prize(&list, 1).name, "A");
        assert_eq!(pick_prize(&list, 2).name, "B");
    }

    #[test]
    fn test_pick_prize_distribution_converges() {
        // 权重 1:3, 10 万次抽取, A 的期望占比 25%
        let list = vec![test_prize(1, "A", 1), test_prize(2, "B", 3)];
        let total_weight: i32 = list.iter().map(|p| p.weight).sum();
        let mut rng = rand::thread_rng();
        let mut hits_a = 0u32;
        for _ in 0..100_000 {
            let roll = rng.gen_range(0..total_weight);
            if pick_prize(&list, roll).name == "A" {
                hits_a += 1;
            }
        }
        // 期望 25000, 标准差约 137, 给出宽松区间
        assert!(
            (24_000..=26_000).contains(&hits_a),
            "observed A hits = {hits_a}"
        );
    }

    async fn setup_db() -> DatabaseConnection {
        let mut opts = ConnectOptions::new("sqlite::memory:".to_string());
        // 内存库必须单连接, 否则每个连接各自是一个空库
        opts.max_connections(1).sqlx_logging(false);
        let db = Database::connect(opts).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        // 清空迁移种子奖品, 由各测试自行配置
        prizes::Entity::delete_many().exec(&db).await.unwrap();
        db
    }

    async fn seed_registration(db: &DatabaseConnection, qr_code: &str) {
        registrations::ActiveModel {
            qr_code: Set(qr_code.to_string()),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    async fn seed_prize(db: &DatabaseConnection, name: &str, weight: i32, remaining: i64) {
        prizes::ActiveModel {
            name: Set(name.to_string()),
            weight: Set(weight),
            remaining_count: Set(remaining),
            is_active: Set(true),
            created_at: Set(Some(Utc::now())),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    async fn remaining_of(db: &DatabaseConnection, name: &str) -> i64 {
        prizes::Entity::find()
            .filter(prizes::Column::Name.eq(name))
            .one(db)
            .await
            .unwrap()
            .unwrap()
            .remaining_count
    }

    #[tokio::test]
    async fn test_verify_unknown_code_is_invalid() {
        let db = setup_db().await;
        let service = ParticipationService::new(db);

        let resp = service.verify("NOPE999").await.unwrap();
        assert!(!resp.valid);
        assert!(!resp.eligible);
        assert!(!resp.claimed);
        assert_eq!(resp.message, "Invalid QR code");
    }

    #[tokio::test]
    async fn test_verify_empty_code_is_rejected() {
        let db = setup_db().await;
        let service = ParticipationService::new(db);

        let err = service.verify("   ").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_spin_unregistered_code_not_found() {
        let db = setup_db().await;
        seed_prize(&db, "10% Off", 1, 5).await;
        let service = ParticipationService::new(db);

        let err = service.spin("NOPE999", None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_spin_without_prizes_fails() {
        let db = setup_db().await;
        seed_registration(&db, "LOOK001").await;
        let service = ParticipationService::new(db);

        let err = service.spin("LOOK001", None).await.unwrap_err();
        assert!(matches!(err, AppError::NoPrizesAvailable));
    }

    #[tokio::test]
    async fn test_claim_without_record_not_found() {
        let db = setup_db().await;
        seed_registration(&db, "LOOK001").await;
        let service = ParticipationService::new(db);

        let err = service.claim("LOOK001").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    /// 完整流程: 校验 -> 抽奖 -> 领取 -> 再次校验
    #[tokio::test]
    async fn test_full_participation_flow() {
        let db = setup_db().await;
        seed_registration(&db, "LOOK001").await;
        seed_prize(&db, "10% Off", 1, 5).await;
        let service = ParticipationService::new(db.clone());

        let verify = service.verify("LOOK001").await.unwrap();
        assert!(verify.valid);
        assert!(verify.eligible);

        let spin = service.spin("LOOK001", Some("203.0.113.7".to_string())).await.unwrap();
        assert_eq!(spin.prize, "10% Off");
        assert_eq!(remaining_of(&db, "10% Off").await, 4);

        let claim = service.claim("LOOK001").await.unwrap();
        assert!(claim.claimed);
        assert_eq!(claim.prize, "10% Off");

        let verify_again = service.verify("LOOK001").await.unwrap();
        assert!(verify_again.valid);
        assert!(!verify_again.eligible);
        assert!(verify_again.claimed);
    }

    #[tokio::test]
    async fn test_second_spin_rejected() {
        let db = setup_db().await;
        seed_registration(&db, "LOOK001").await;
        seed_prize(&db, "Pet Treat", 1, 10).await;
        let service = ParticipationService::new(db.clone());

        service.spin("LOOK001", None).await.unwrap();
        let err = service.spin("LOOK001", None).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyParticipated));
        // 库存只扣了一次
        assert_eq!(remaining_of(&db, "Pet Treat").await, 9);
    }

    #[tokio::test]
    async fn test_claim_is_idempotent() {
        let db = setup_db().await;
        seed_registration(&db, "LOOK002").await;
        seed_prize(&db, "Free Sample", 1, 3).await;
        let service = ParticipationService::new(db);

        service.spin("LOOK002", None).await.unwrap();
        let first = service.claim("LOOK002").await.unwrap();
        let second = service.claim("LOOK002").await.unwrap();
        assert!(first.claimed);
        assert!(second.claimed);
        assert_eq!(first.prize, second.prize);
    }

    /// 库存耗尽: 扣减到 0 后不再中奖, 库存不会为负
    #[tokio::test]
    async fn test_stock_depletion_never_negative() {
        let db = setup_db().await;
        seed_registration(&db, "LOOK010").await;
        seed_registration(&db, "LOOK011").await;
        seed_prize(&db, "50% Off", 1, 1).await;
        let service = ParticipationService::new(db.clone());

        let first = service.spin("LOOK010", None).await.unwrap();
        assert_eq!(first.prize, "50% Off");
        assert_eq!(remaining_of(&db, "50% Off").await, 0);

        let err = service.spin("LOOK011", None).await.unwrap_err();
        assert!(matches!(err, AppError::NoPrizesAvailable));
        assert_eq!(remaining_of(&db, "50% Off").await, 0);

        let model = prizes::Entity::find()
            .filter(prizes::Column::Name.eq("50% Off"))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert!(!model.is_available());
    }

    /// 并发场景: 同一二维码两个并发请求, 恰好一个成功, 库存恰好扣 1
    #[tokio::test]
    async fn test_concurrent_spins_single_winner() {
        let db = setup_db().await;
        seed_registration(&db, "LOOK020").await;
        seed_prize(&db, "Mystery Gift", 1, 10).await;
        let service_a = ParticipationService::new(db.clone());
        let service_b = ParticipationService::new(db.clone());

        let (a, b) = tokio::join!(
            service_a.spin("LOOK020", None),
            service_b.spin("LOOK020", None)
        );

        let outcomes = [a, b];
        let winners = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        let loser = outcomes.iter().find(|r| r.is_err()).unwrap();
        assert!(matches!(
            loser.as_ref().unwrap_err(),
            AppError::AlreadyParticipated | AppError::AllocationConflict
        ));
        assert_eq!(remaining_of(&db, "Mystery Gift").await, 9);
    }

    #[tokio::test]
    async fn test_list_prizes_only_active() {
        let db = setup_db().await;
        seed_prize(&db, "Pet Toy", 15, 40).await;
        seed_prize(&db, "Pet Treat", 15, 60).await;
        // 下线一个奖品
        let model = prizes::Entity::find()
            .filter(prizes::Column::Name.eq("Pet Toy"))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let mut am = model.into_active_model();
        am.is_active = Set(false);
        am.update(&db).await.unwrap();

        let service = ParticipationService::new(db);
        let list = service.list_prizes().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Pet Treat");
    }

    #[tokio::test]
    async fn test_list_records_paginated() {
        let db = setup_db().await;
        seed_registration(&db, "LOOK030").await;
        seed_registration(&db, "LOOK031").await;
        seed_prize(&db, "Pet Accessory", 1, 100).await;
        let service = ParticipationService::new(db);

        service.spin("LOOK030", None).await.unwrap();
        service.spin("LOOK031", None).await.unwrap();

        let page = service
            .list_records(&RecordQuery {
                page: Some(1),
                per_page: Some(1),
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.data.len(), 1);
    }
}
