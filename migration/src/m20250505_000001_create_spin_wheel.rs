use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

/// Registrations (展会预注册二维码)
#[derive(DeriveIden)]
enum Registrations {
    Table,
    Id,
    QrCode,
    CreatedAt,
}

/// Prizes (转盘奖品配置表)
#[derive(DeriveIden)]
enum Prizes {
    Table,
    Id,
    Name,
    Weight,
    RemainingCount,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

/// Participants (参与记录表)
#[derive(DeriveIden)]
enum Participants {
    Table,
    Id,
    QrCode,
    PrizeName,
    Claimed,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 权重为相对概率 (中奖概率 = weight / 启用奖品权重之和)
/// 转盘初始配置 (八个扇区, 与摊位转盘一致):
/// - Pet Toy 15 (库存40)
/// - 10% Off 25 (库存200)
/// - Pet Treat 15 (库存60)
/// - Free Sample 20 (库存100)
/// - 50% Off 2 (库存10)
/// - Pet Accessory 8 (库存30)
/// - 20% Off 10 (库存80)
/// - Mystery Gift 5 (库存20)
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 预注册表
        manager
            .create_table(
                Table::create()
                    .table(Registrations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Registrations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Registrations::QrCode)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Registrations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // qr_code 唯一索引（一个二维码一条注册记录）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_registrations_qr_code_unique")
                    .table(Registrations::Table)
                    .col(Registrations::QrCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 奖品表
        manager
            .create_table(
                Table::create()
                    .table(Prizes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Prizes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Prizes::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Prizes::Weight).integer().not_null())
                    .col(
                        ColumnDef::new(Prizes::RemainingCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Prizes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Prizes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Prizes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 奖品名唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_prizes_name_unique")
                    .table(Prizes::Table)
                    .col(Prizes::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 参与记录表
        manager
            .create_table(
                Table::create()
                    .table(Participants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Participants::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Participants::QrCode)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participants::PrizeName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participants::Claimed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Participants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Participants::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // qr_code 唯一索引: "一人一次" 在并发下的最终裁决
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_participants_qr_code_unique")
                    .table(Participants::Table)
                    .col(Participants::QrCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 初始化奖品数据
        let conn = manager.get_connection();
        let insert_sql = r#"
INSERT INTO prizes (name, weight, remaining_count, is_active)
VALUES
 ('Pet Toy', 15, 40, TRUE),
 ('10% Off', 25, 200, TRUE),
 ('Pet Treat', 15, 60, TRUE),
 ('Free Sample', 20, 100, TRUE),
 ('50% Off', 2, 10, TRUE),
 ('Pet Accessory', 8, 30, TRUE),
 ('20% Off', 10, 80, TRUE),
 ('Mystery Gift', 5, 20, TRUE)
ON CONFLICT (name) DO NOTHING;
"#;
        conn.execute(Statement::from_string(
            manager.get_database_backend(),
            insert_sql.to_string(),
        ))
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：参与记录 -> 奖品 -> 注册
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(Participants::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Prizes::Table).to_owned())
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(Registrations::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
