use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Country::Table)
                    .if_not_exists()
                    .col(pk_auto(Country::Id))
                    .col(string(Country::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Person::Table)
                    .if_not_exists()
                    .col(pk_auto(Person::Id))
                    .col(string(Person::FirstName))
                    .col(string(Person::LastName))
                    .col(string(Person::SecondName).default(""))
                    .col(string(Person::BirthDate))
                    .col(string_null(Person::DeathDate))
                    .col(text(Person::Description))
                    .col(string(Person::Image))
                    .col(string(Person::Slug).default(""))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PersonCountry::Table)
                    .if_not_exists()
                    .col(pk_auto(PersonCountry::Id))
                    .col(integer(PersonCountry::PersonId))
                    .col(integer(PersonCountry::CountryId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_person_country_person")
                            .from(PersonCountry::Table, PersonCountry::PersonId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_person_country_country")
                            .from(PersonCountry::Table, PersonCountry::CountryId)
                            .to(Country::Table, Country::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_person_country_unique")
                    .table(PersonCountry::Table)
                    .col(PersonCountry::PersonId)
                    .col(PersonCountry::CountryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genre::Table)
                    .if_not_exists()
                    .col(pk_auto(Genre::Id))
                    .col(string(Genre::Name))
                    .col(text(Genre::Description))
                    .col(string_uniq(Genre::Slug))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Category::Table)
                    .if_not_exists()
                    .col(pk_auto(Category::Id))
                    .col(string(Category::Name))
                    .col(text(Category::Description))
                    .col(string_uniq(Category::Slug))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Movie::Table)
                    .if_not_exists()
                    .col(pk_auto(Movie::Id))
                    .col(string(Movie::Title))
                    .col(string(Movie::Tagline).default(""))
                    .col(text(Movie::Description))
                    .col(string(Movie::Poster))
                    .col(integer(Movie::Year))
                    .col(string(Movie::Premiere))
                    .col(big_integer(Movie::Budget).default(0))
                    .col(big_integer(Movie::FeesInUsa).default(0))
                    .col(big_integer(Movie::FeesInWorld).default(0))
                    .col(integer_null(Movie::CategoryId))
                    .col(boolean(Movie::Draft).default(false))
                    .col(string(Movie::Slug).default(""))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_category")
                            .from(Movie::Table, Movie::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_draft")
                    .table(Movie::Table)
                    .col(Movie::Draft)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_year")
                    .table(Movie::Table)
                    .col(Movie::Year)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieCountry::Table)
                    .if_not_exists()
                    .col(pk_auto(MovieCountry::Id))
                    .col(integer(MovieCountry::MovieId))
                    .col(integer(MovieCountry::CountryId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_country_movie")
                            .from(MovieCountry::Table, MovieCountry::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_country_country")
                            .from(MovieCountry::Table, MovieCountry::CountryId)
                            .to(Country::Table, Country::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_country_unique")
                    .table(MovieCountry::Table)
                    .col(MovieCountry::MovieId)
                    .col(MovieCountry::CountryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieDirector::Table)
                    .if_not_exists()
                    .col(pk_auto(MovieDirector::Id))
                    .col(integer(MovieDirector::MovieId))
                    .col(integer(MovieDirector::PersonId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_director_movie")
                            .from(MovieDirector::Table, MovieDirector::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_director_person")
                            .from(MovieDirector::Table, MovieDirector::PersonId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_director_unique")
                    .table(MovieDirector::Table)
                    .col(MovieDirector::MovieId)
                    .col(MovieDirector::PersonId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieActor::Table)
                    .if_not_exists()
                    .col(pk_auto(MovieActor::Id))
                    .col(integer(MovieActor::MovieId))
                    .col(integer(MovieActor::PersonId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_actor_movie")
                            .from(MovieActor::Table, MovieActor::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_actor_person")
                            .from(MovieActor::Table, MovieActor::PersonId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_actor_unique")
                    .table(MovieActor::Table)
                    .col(MovieActor::MovieId)
                    .col(MovieActor::PersonId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieGenre::Table)
                    .if_not_exists()
                    .col(pk_auto(MovieGenre::Id))
                    .col(integer(MovieGenre::MovieId))
                    .col(integer(MovieGenre::GenreId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_genre_movie")
                            .from(MovieGenre::Table, MovieGenre::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_genre_genre")
                            .from(MovieGenre::Table, MovieGenre::GenreId)
                            .to(Genre::Table, Genre::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_genre_unique")
                    .table(MovieGenre::Table)
                    .col(MovieGenre::MovieId)
                    .col(MovieGenre::GenreId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieShot::Table)
                    .if_not_exists()
                    .col(pk_auto(MovieShot::Id))
                    .col(string(MovieShot::Title))
                    .col(text(MovieShot::Description))
                    .col(string(MovieShot::Image))
                    .col(integer(MovieShot::MovieId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_shot_movie")
                            .from(MovieShot::Table, MovieShot::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MovieShot::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieGenre::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieActor::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieDirector::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieCountry::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movie::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Category::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genre::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(PersonCountry::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Person::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Country::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Country {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Person {
    Table,
    Id,
    FirstName,
    LastName,
    SecondName,
    BirthDate,
    DeathDate,
    Description,
    Image,
    Slug,
}

#[derive(DeriveIden)]
enum PersonCountry {
    Table,
    Id,
    PersonId,
    CountryId,
}

#[derive(DeriveIden)]
enum Genre {
    Table,
    Id,
    Name,
    Description,
    Slug,
}

#[derive(DeriveIden)]
enum Category {
    Table,
    Id,
    Name,
    Description,
    Slug,
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    Id,
    Title,
    Tagline,
    Description,
    Poster,
    Year,
    Premiere,
    Budget,
    FeesInUsa,
    FeesInWorld,
    CategoryId,
    Draft,
    Slug,
}

#[derive(DeriveIden)]
enum MovieCountry {
    Table,
    Id,
    MovieId,
    CountryId,
}

#[derive(DeriveIden)]
enum MovieDirector {
    Table,
    Id,
    MovieId,
    PersonId,
}

#[derive(DeriveIden)]
enum MovieActor {
    Table,
    Id,
    MovieId,
    PersonId,
}

#[derive(DeriveIden)]
enum MovieGenre {
    Table,
    Id,
    MovieId,
    GenreId,
}

#[derive(DeriveIden)]
enum MovieShot {
    Table,
    Id,
    Title,
    Description,
    Image,
    MovieId,
}
