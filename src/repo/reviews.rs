use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{Set, Unchanged},
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
    sea_query::Expr,
};

use crate::{
    entities::{movie, review},
    error::{AppError, AppResult},
    models::{CreateReview, UpdateReview},
};

#[derive(Clone)]
pub struct ReviewRepo {
    db: DatabaseConnection,
}

impl ReviewRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, payload: CreateReview) -> AppResult<i32> {
        payload.validate()?;

        if movie::Entity::find_by_id(payload.movie).one(&self.db).await?.is_none() {
            return Err(AppError::NotFound("movie"));
        }

        // A reply must stay within its movie's thread.
        if let Some(parent_id) = payload.parent {
            match review::Entity::find_by_id(parent_id).one(&self.db).await? {
                None => return Err(AppError::validation("parent", "unknown parent review")),
                Some(parent) if parent.movie_id != payload.movie => {
                    return Err(AppError::validation(
                        "parent",
                        "parent review is for a different movie",
                    ));
                },
                Some(_) => {},
            }
        }

        let model = review::ActiveModel {
            id: Default::default(),
            email: Set(payload.email),
            name: Set(payload.name),
            text: Set(payload.text),
            parent_id: Set(payload.parent),
            movie_id: Set(payload.movie),
        };
        Ok(review::Entity::insert(model).exec(&self.db).await?.last_insert_id)
    }

    pub async fn get(&self, id: i32) -> AppResult<review::Model> {
        review::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound("review"))
    }

    pub async fn update(&self, id: i32, payload: UpdateReview) -> AppResult<()> {
        payload.validate()?;
        self.get(id).await?;

        let mut model = review::ActiveModel { id: Unchanged(id), ..Default::default() };
        let mut touched = false;
        if let Some(name) = payload.name {
            model.name = Set(name);
            touched = true;
        }
        if let Some(text) = payload.text {
            model.text = Set(text);
            touched = true;
        }
        if touched {
            model.update(&self.db).await?;
        }
        Ok(())
    }

    /// Deletes the review; direct replies are detached and become top-level.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let txn = self.db.begin().await?;

        review::Entity::update_many()
            .col_expr(review::Column::ParentId, Expr::value(None::<i32>))
            .filter(review::Column::ParentId.eq(id))
            .exec(&txn)
            .await?;

        let result = review::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("review"));
        }

        txn.commit().await?;
        Ok(())
    }

    pub async fn for_movie(&self, movie_id: i32) -> AppResult<Vec<review::Model>> {
        Ok(review::Entity::find()
            .filter(review::Column::MovieId.eq(movie_id))
            .order_by_asc(review::Column::Id)
            .all(&self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::DatabaseConnection;

    use super::*;
    use crate::{db::connect_for_tests, review_tree};

    async fn seed_movie(db: &DatabaseConnection, title: &str) -> i32 {
        movie::ActiveModel {
            id: Default::default(),
            title: Set(title.to_string()),
            tagline: Set(String::new()),
            description: Set("seed".to_string()),
            poster: Set("movies/seed.jpg".to_string()),
            year: Set(2000),
            premiere: Set("2000-01-01".to_string()),
            budget: Set(0),
            fees_in_usa: Set(0),
            fees_in_world: Set(0),
            category_id: Set(None),
            draft: Set(false),
            slug: Set(String::new()),
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    fn payload(movie: i32, name: &str, parent: Option<i32>) -> CreateReview {
        CreateReview {
            movie,
            name: name.to_string(),
            email: format!("{name}@example.com"),
            text: format!("{name} says hi"),
            parent,
        }
    }

    #[tokio::test]
    async fn reply_chain_serializes_as_one_root() {
        let db = connect_for_tests().await;
        let movie_id = seed_movie(&db, "Alien").await;
        let repo = ReviewRepo::new(db);

        let a = repo.create(payload(movie_id, "a", None)).await.unwrap();
        let b = repo.create(payload(movie_id, "b", Some(a))).await.unwrap();
        let c = repo.create(payload(movie_id, "c", Some(b))).await.unwrap();

        let forest = review_tree::build(&repo.for_movie(movie_id).await.unwrap());
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].id, a);
        assert_eq!(forest[0].children.len(), 1);
        assert_eq!(forest[0].children[0].id, b);
        assert_eq!(forest[0].children[0].children.len(), 1);
        assert_eq!(forest[0].children[0].children[0].id, c);
    }

    #[tokio::test]
    async fn parent_from_another_movie_is_rejected() {
        let db = connect_for_tests().await;
        let first = seed_movie(&db, "Alien").await;
        let second = seed_movie(&db, "Aliens").await;
        let repo = ReviewRepo::new(db);

        let root = repo.create(payload(first, "a", None)).await.unwrap();
        let err = repo.create(payload(second, "b", Some(root))).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(repo.for_movie(second).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_parent_is_rejected() {
        let db = connect_for_tests().await;
        let movie_id = seed_movie(&db, "Alien").await;
        let repo = ReviewRepo::new(db);

        let err = repo.create(payload(movie_id, "a", Some(999))).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn deleting_a_parent_detaches_its_replies() {
        let db = connect_for_tests().await;
        let movie_id = seed_movie(&db, "Alien").await;
        let repo = ReviewRepo::new(db);

        let a = repo.create(payload(movie_id, "a", None)).await.unwrap();
        let b = repo.create(payload(movie_id, "b", Some(a))).await.unwrap();
        repo.delete(a).await.unwrap();

        let rows = repo.for_movie(movie_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, b);
        assert_eq!(rows[0].parent_id, None);
    }

    #[tokio::test]
    async fn update_touches_only_provided_fields() {
        let db = connect_for_tests().await;
        let movie_id = seed_movie(&db, "Alien").await;
        let repo = ReviewRepo::new(db);

        let id = repo.create(payload(movie_id, "a", None)).await.unwrap();
        repo.update(id, UpdateReview { name: None, text: Some("edited".to_string()) })
            .await
            .unwrap();

        let row = repo.get(id).await.unwrap();
        assert_eq!(row.name, "a");
        assert_eq!(row.text, "edited");
    }
}
