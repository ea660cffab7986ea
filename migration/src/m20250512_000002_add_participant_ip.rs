use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Participants {
    Table,
    IpAddress,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 参与记录增加来源 IP (展会现场排查重复刷码用)
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Participants::Table)
                    .add_column(ColumnDef::new(Participants::IpAddress).string_len(64).null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Participants::Table)
                    .drop_column(Participants::IpAddress)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
