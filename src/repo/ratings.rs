use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    sea_query::OnConflict,
};

use crate::{
    entities::{movie, rating, rating_star},
    error::{AppError, AppResult},
    models::CreateRating,
};

#[derive(Clone)]
pub struct RatingRepo {
    db: DatabaseConnection,
}

impl RatingRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records the requester's rating, overwriting any earlier one from the
    /// same address for the same movie. A single conflict-clause insert keeps
    /// concurrent submissions from creating duplicates.
    pub async fn upsert(&self, ip: &str, payload: &CreateRating) -> AppResult<()> {
        if movie::Entity::find_by_id(payload.movie).one(&self.db).await?.is_none() {
            return Err(AppError::NotFound("movie"));
        }

        let Some(star) = rating_star::Entity::find()
            .filter(rating_star::Column::Value.eq(payload.star))
            .one(&self.db)
            .await?
        else {
            return Err(AppError::validation("star", "unknown star value"));
        };

        let model = rating::ActiveModel {
            id: Default::default(),
            ip: Set(ip.to_string()),
            movie_id: Set(payload.movie),
            star_id: Set(star.id),
        };

        rating::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([rating::Column::Ip, rating::Column::MovieId])
                    .update_columns([rating::Column::StarId])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(())
    }

    pub async fn get(&self, id: i32) -> AppResult<rating::Model> {
        rating::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound("rating"))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = rating::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("rating"));
        }
        Ok(())
    }

    /// Stars in descending value order, the way pickers display them.
    pub async fn stars(&self) -> AppResult<Vec<rating_star::Model>> {
        Ok(rating_star::Entity::find()
            .order_by_desc(rating_star::Column::Value)
            .all(&self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{ActiveModelTrait, DatabaseConnection};

    use super::*;
    use crate::db::connect_for_tests;

    async fn seed_movie(db: &DatabaseConnection) -> i32 {
        movie::ActiveModel {
            id: Default::default(),
            title: Set("Alien".to_string()),
            tagline: Set(String::new()),
            description: Set("In space no one can hear you scream.".to_string()),
            poster: Set("movies/alien.jpg".to_string()),
            year: Set(1979),
            premiere: Set("1979-05-25".to_string()),
            budget: Set(11_000_000),
            fees_in_usa: Set(0),
            fees_in_world: Set(0),
            category_id: Set(None),
            draft: Set(false),
            slug: Set("1-alien".to_string()),
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    async fn stored_ratings(db: &DatabaseConnection, movie_id: i32) -> Vec<(String, i16)> {
        let rows = rating::Entity::find()
            .filter(rating::Column::MovieId.eq(movie_id))
            .find_also_related(rating_star::Entity)
            .all(db)
            .await
            .unwrap();
        rows.into_iter().map(|(r, s)| (r.ip, s.unwrap().value)).collect()
    }

    #[tokio::test]
    async fn resubmission_overwrites_instead_of_duplicating() {
        let db = connect_for_tests().await;
        let movie_id = seed_movie(&db).await;
        let repo = RatingRepo::new(db.clone());

        repo.upsert("1.2.3.4", &CreateRating { movie: movie_id, star: 3 }).await.unwrap();
        repo.upsert("1.2.3.4", &CreateRating { movie: movie_id, star: 5 }).await.unwrap();

        assert_eq!(stored_ratings(&db, movie_id).await, vec![("1.2.3.4".to_string(), 5)]);
    }

    #[tokio::test]
    async fn different_addresses_keep_separate_rows() {
        let db = connect_for_tests().await;
        let movie_id = seed_movie(&db).await;
        let repo = RatingRepo::new(db.clone());

        repo.upsert("1.2.3.4", &CreateRating { movie: movie_id, star: 3 }).await.unwrap();
        repo.upsert("5.6.7.8", &CreateRating { movie: movie_id, star: 5 }).await.unwrap();

        assert_eq!(stored_ratings(&db, movie_id).await.len(), 2);
    }

    #[tokio::test]
    async fn unknown_star_value_is_a_validation_error() {
        let db = connect_for_tests().await;
        let movie_id = seed_movie(&db).await;
        let repo = RatingRepo::new(db);

        let err =
            repo.upsert("1.2.3.4", &CreateRating { movie: movie_id, star: 11 }).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_movie_is_not_found() {
        let db = connect_for_tests().await;
        let repo = RatingRepo::new(db);

        let err = repo.upsert("1.2.3.4", &CreateRating { movie: 999, star: 3 }).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn stars_are_seeded_and_listed_descending() {
        let db = connect_for_tests().await;
        let repo = RatingRepo::new(db);

        let values: Vec<i16> = repo.stars().await.unwrap().into_iter().map(|s| s.value).collect();
        assert_eq!(values, vec![5, 4, 3, 2, 1]);
    }
}
