use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RatingStar::Table)
                    .if_not_exists()
                    .col(pk_auto(RatingStar::Id))
                    .col(small_integer(RatingStar::Value).unique_key())
                    .to_owned(),
            )
            .await?;

        let mut seed = Query::insert()
            .into_table(RatingStar::Table)
            .columns([RatingStar::Value])
            .to_owned();
        for value in 1..=5 {
            seed.values_panic([value.into()]);
        }
        manager.exec_stmt(seed).await?;

        manager
            .create_table(
                Table::create()
                    .table(Rating::Table)
                    .if_not_exists()
                    .col(pk_auto(Rating::Id))
                    .col(string(Rating::Ip))
                    .col(integer(Rating::MovieId))
                    .col(integer(Rating::StarId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rating_movie")
                            .from(Rating::Table, Rating::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rating_star")
                            .from(Rating::Table, Rating::StarId)
                            .to(RatingStar::Table, RatingStar::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rating_ip_movie_unique")
                    .table(Rating::Table)
                    .col(Rating::Ip)
                    .col(Rating::MovieId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Review::Table)
                    .if_not_exists()
                    .col(pk_auto(Review::Id))
                    .col(string(Review::Email))
                    .col(string(Review::Name))
                    .col(text(Review::Text))
                    .col(integer_null(Review::ParentId))
                    .col(integer(Review::MovieId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_parent")
                            .from(Review::Table, Review::ParentId)
                            .to(Review::Table, Review::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_movie")
                            .from(Review::Table, Review::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_review_movie")
                    .table(Review::Table)
                    .col(Review::MovieId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Review::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Rating::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(RatingStar::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum RatingStar {
    Table,
    Id,
    Value,
}

#[derive(DeriveIden)]
enum Rating {
    Table,
    Id,
    Ip,
    MovieId,
    StarId,
}

#[derive(DeriveIden)]
enum Review {
    Table,
    Id,
    Email,
    Name,
    Text,
    ParentId,
    MovieId,
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    Id,
}
