use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApiToken::Table)
                    .if_not_exists()
                    .col(string(ApiToken::Token).primary_key())
                    .col(string(ApiToken::Email))
                    .col(boolean(ApiToken::IsStaff).default(false))
                    .col(big_integer(ApiToken::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_api_token_email")
                    .table(ApiToken::Table)
                    .col(ApiToken::Email)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ApiToken::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum ApiToken {
    Table,
    Token,
    Email,
    IsStaff,
    CreatedAt,
}
