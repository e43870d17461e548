use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{Set, Unchanged},
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
    sea_query::Expr,
};

use crate::{
    entities::{
        category, country, genre, movie, movie_country, movie_genre, movie_shot, person_country,
        rating, rating_star,
    },
    error::{AppError, AppResult},
    models::{
        CategoryItem, CountryItem, CreateCategory, CreateCountry, CreateGenre, CreateShot,
        CreateStar, GenreItem, MovieShotItem, StarItem,
    },
};

/// Lookup tables and the movie-shot gallery: small, admin-curated rows that
/// the rest of the catalog hangs off.
#[derive(Clone)]
pub struct TaxonomyRepo {
    db: DatabaseConnection,
}

impl TaxonomyRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // Genres.

    pub async fn list_genres(&self) -> AppResult<Vec<GenreItem>> {
        let rows = genre::Entity::find().order_by_asc(genre::Column::Id).all(&self.db).await?;
        Ok(rows.into_iter().map(genre_item).collect())
    }

    pub async fn create_genre(&self, payload: CreateGenre) -> AppResult<GenreItem> {
        payload.validate()?;
        self.check_genre_slug(&payload.slug, None).await?;

        let model = genre::ActiveModel {
            id: Default::default(),
            name: Set(payload.name),
            description: Set(payload.description),
            slug: Set(payload.slug),
        };
        Ok(genre_item(model.insert(&self.db).await?))
    }

    pub async fn update_genre(&self, id: i32, payload: CreateGenre) -> AppResult<GenreItem> {
        payload.validate()?;
        if genre::Entity::find_by_id(id).one(&self.db).await?.is_none() {
            return Err(AppError::NotFound("genre"));
        }
        self.check_genre_slug(&payload.slug, Some(id)).await?;

        let model = genre::ActiveModel {
            id: Unchanged(id),
            name: Set(payload.name),
            description: Set(payload.description),
            slug: Set(payload.slug),
        };
        Ok(genre_item(model.update(&self.db).await?))
    }

    pub async fn delete_genre(&self, id: i32) -> AppResult<()> {
        let txn = self.db.begin().await?;
        movie_genre::Entity::delete_many()
            .filter(movie_genre::Column::GenreId.eq(id))
            .exec(&txn)
            .await?;
        let result = genre::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("genre"));
        }
        txn.commit().await?;
        Ok(())
    }

    async fn check_genre_slug(&self, slug: &str, exclude: Option<i32>) -> AppResult<()> {
        let mut query = genre::Entity::find().filter(genre::Column::Slug.eq(slug));
        if let Some(id) = exclude {
            query = query.filter(genre::Column::Id.ne(id));
        }
        if query.one(&self.db).await?.is_some() {
            return Err(AppError::validation("slug", "already in use"));
        }
        Ok(())
    }

    // Categories.

    pub async fn list_categories(&self) -> AppResult<Vec<CategoryItem>> {
        let rows =
            category::Entity::find().order_by_asc(category::Column::Id).all(&self.db).await?;
        Ok(rows.into_iter().map(category_item).collect())
    }

    pub async fn create_category(&self, payload: CreateCategory) -> AppResult<CategoryItem> {
        payload.validate()?;
        self.check_category_slug(&payload.slug, None).await?;

        let model = category::ActiveModel {
            id: Default::default(),
            name: Set(payload.name),
            description: Set(payload.description),
            slug: Set(payload.slug),
        };
        Ok(category_item(model.insert(&self.db).await?))
    }

    pub async fn update_category(
        &self,
        id: i32,
        payload: CreateCategory,
    ) -> AppResult<CategoryItem> {
        payload.validate()?;
        if category::Entity::find_by_id(id).one(&self.db).await?.is_none() {
            return Err(AppError::NotFound("category"));
        }
        self.check_category_slug(&payload.slug, Some(id)).await?;

        let model = category::ActiveModel {
            id: Unchanged(id),
            name: Set(payload.name),
            description: Set(payload.description),
            slug: Set(payload.slug),
        };
        Ok(category_item(model.update(&self.db).await?))
    }

    /// Movies in the category stay and lose the reference, matching the
    /// nullable foreign key.
    pub async fn delete_category(&self, id: i32) -> AppResult<()> {
        let txn = self.db.begin().await?;
        movie::Entity::update_many()
            .col_expr(movie::Column::CategoryId, Expr::value(None::<i32>))
            .filter(movie::Column::CategoryId.eq(id))
            .exec(&txn)
            .await?;
        let result = category::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("category"));
        }
        txn.commit().await?;
        Ok(())
    }

    async fn check_category_slug(&self, slug: &str, exclude: Option<i32>) -> AppResult<()> {
        let mut query = category::Entity::find().filter(category::Column::Slug.eq(slug));
        if let Some(id) = exclude {
            query = query.filter(category::Column::Id.ne(id));
        }
        if query.one(&self.db).await?.is_some() {
            return Err(AppError::validation("slug", "already in use"));
        }
        Ok(())
    }

    // Countries.

    pub async fn list_countries(&self) -> AppResult<Vec<CountryItem>> {
        let rows = country::Entity::find().order_by_asc(country::Column::Id).all(&self.db).await?;
        Ok(rows.into_iter().map(|c| CountryItem { id: c.id, name: c.name }).collect())
    }

    pub async fn create_country(&self, payload: CreateCountry) -> AppResult<CountryItem> {
        payload.validate()?;
        let model = country::ActiveModel { id: Default::default(), name: Set(payload.name) };
        let row = model.insert(&self.db).await?;
        Ok(CountryItem { id: row.id, name: row.name })
    }

    pub async fn delete_country(&self, id: i32) -> AppResult<()> {
        let txn = self.db.begin().await?;
        movie_country::Entity::delete_many()
            .filter(movie_country::Column::CountryId.eq(id))
            .exec(&txn)
            .await?;
        person_country::Entity::delete_many()
            .filter(person_country::Column::CountryId.eq(id))
            .exec(&txn)
            .await?;
        let result = country::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("country"));
        }
        txn.commit().await?;
        Ok(())
    }

    // Rating stars.

    pub async fn create_star(&self, payload: CreateStar) -> AppResult<StarItem> {
        payload.validate()?;
        let exists = rating_star::Entity::find()
            .filter(rating_star::Column::Value.eq(payload.value))
            .one(&self.db)
            .await?
            .is_some();
        if exists {
            return Err(AppError::validation("value", "already exists"));
        }
        let model =
            rating_star::ActiveModel { id: Default::default(), value: Set(payload.value) };
        let row = model.insert(&self.db).await?;
        Ok(StarItem { id: row.id, value: row.value })
    }

    /// Ratings cast with the star go with it.
    pub async fn delete_star(&self, id: i32) -> AppResult<()> {
        let txn = self.db.begin().await?;
        rating::Entity::delete_many().filter(rating::Column::StarId.eq(id)).exec(&txn).await?;
        let result = rating_star::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("star"));
        }
        txn.commit().await?;
        Ok(())
    }

    // Movie shots.

    pub async fn create_shot(&self, payload: CreateShot) -> AppResult<MovieShotItem> {
        payload.validate()?;
        if movie::Entity::find_by_id(payload.movie).one(&self.db).await?.is_none() {
            return Err(AppError::NotFound("movie"));
        }
        let model = movie_shot::ActiveModel {
            id: Default::default(),
            title: Set(payload.title),
            description: Set(payload.description),
            image: Set(payload.image),
            movie_id: Set(payload.movie),
        };
        let row = model.insert(&self.db).await?;
        Ok(MovieShotItem {
            id: row.id,
            title: row.title,
            description: row.description,
            image: row.image,
        })
    }

    pub async fn delete_shot(&self, id: i32) -> AppResult<()> {
        let result = movie_shot::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("shot"));
        }
        Ok(())
    }
}

fn genre_item(row: genre::Model) -> GenreItem {
    GenreItem { id: row.id, name: row.name, description: row.description, slug: row.slug }
}

fn category_item(row: category::Model) -> CategoryItem {
    CategoryItem { id: row.id, name: row.name, description: row.description, slug: row.slug }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_for_tests;

    fn genre_payload(slug: &str) -> CreateGenre {
        CreateGenre {
            name: "Horror".to_string(),
            description: String::new(),
            slug: slug.to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_genre_slug_is_rejected() {
        let db = connect_for_tests().await;
        let repo = TaxonomyRepo::new(db);

        repo.create_genre(genre_payload("horror")).await.unwrap();
        let err = repo.create_genre(genre_payload("horror")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn updating_a_genre_keeps_its_own_slug_available() {
        let db = connect_for_tests().await;
        let repo = TaxonomyRepo::new(db);

        let created = repo.create_genre(genre_payload("horror")).await.unwrap();
        let mut update = genre_payload("horror");
        update.name = "Horror & Thriller".to_string();
        let updated = repo.update_genre(created.id, update).await.unwrap();
        assert_eq!(updated.name, "Horror & Thriller");
    }

    #[tokio::test]
    async fn duplicate_star_value_is_rejected() {
        let db = connect_for_tests().await;
        let repo = TaxonomyRepo::new(db);

        // 1..=5 are seeded by the migration.
        let err = repo.create_star(CreateStar { value: 5 }).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let created = repo.create_star(CreateStar { value: 6 }).await.unwrap();
        assert_eq!(created.value, 6);
    }

    #[tokio::test]
    async fn shot_for_unknown_movie_is_not_found() {
        let db = connect_for_tests().await;
        let repo = TaxonomyRepo::new(db);

        let err = repo
            .create_shot(CreateShot {
                movie: 1,
                title: "Corridor".to_string(),
                description: String::new(),
                image: "shots/corridor.jpg".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
