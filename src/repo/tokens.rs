use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};

use crate::{
    entities::api_token,
    error::{AppError, AppResult},
    models::CreateToken,
};

#[derive(Clone)]
pub struct TokenRepo {
    db: DatabaseConnection,
}

impl TokenRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn issue(&self, payload: CreateToken) -> AppResult<api_token::Model> {
        payload.validate()?;
        let model = api_token::ActiveModel {
            token: Set(uuid::Uuid::new_v4().to_string()),
            email: Set(payload.email),
            is_staff: Set(payload.is_staff),
            created_at: Set(now_sec()),
        };
        Ok(model.insert(&self.db).await?)
    }

    pub async fn lookup(&self, token: &str) -> AppResult<Option<api_token::Model>> {
        Ok(api_token::Entity::find_by_id(token.to_string()).one(&self.db).await?)
    }

    pub async fn revoke(&self, token: &str) -> AppResult<()> {
        let result = api_token::Entity::delete_by_id(token.to_string()).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("token"));
        }
        Ok(())
    }
}

fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_for_tests;

    #[tokio::test]
    async fn issued_tokens_resolve_and_revoke() {
        let db = connect_for_tests().await;
        let repo = TokenRepo::new(db);

        let issued = repo
            .issue(CreateToken { email: "editor@example.com".to_string(), is_staff: false })
            .await
            .unwrap();

        let found = repo.lookup(&issued.token).await.unwrap().unwrap();
        assert_eq!(found.email, "editor@example.com");
        assert!(!found.is_staff);

        repo.revoke(&issued.token).await.unwrap();
        assert!(repo.lookup(&issued.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_tokens_do_not_resolve() {
        let db = connect_for_tests().await;
        let repo = TokenRepo::new(db);
        assert!(repo.lookup("missing").await.unwrap().is_none());
    }
}
