use std::collections::BTreeSet;

use jiff::civil::Date;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{Set, Unchanged},
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};

use crate::{
    entities::{country, movie_actor, movie_director, person, person_country},
    error::{AppError, AppResult, FieldErrors},
    models::{CreatePerson, PersonDetail, PersonListItem},
    slug,
};

#[derive(Clone)]
pub struct PersonRepo {
    db: DatabaseConnection,
}

impl PersonRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<PersonListItem>> {
        let rows = person::Entity::find().order_by_asc(person::Column::Id).all(&self.db).await?;
        Ok(rows
            .into_iter()
            .map(|p| PersonListItem {
                id: p.id,
                name: p.full_name(),
                image: p.image.clone(),
                slug: p.slug,
            })
            .collect())
    }

    pub async fn detail(&self, id: i32) -> AppResult<PersonDetail> {
        let Some(model) = person::Entity::find_by_id(id).one(&self.db).await? else {
            return Err(AppError::NotFound("person"));
        };

        let countries = model
            .find_related(country::Entity)
            .order_by_asc(country::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();

        let today: Date = jiff::Zoned::now().into();
        let age = age_years(&model.birth_date, model.death_date.as_deref(), today);

        Ok(PersonDetail {
            id: model.id,
            full_name: model.full_name(),
            first_name: model.first_name,
            last_name: model.last_name,
            second_name: model.second_name,
            birth_date: model.birth_date,
            death_date: model.death_date,
            age,
            description: model.description,
            image: model.image,
            countries,
            slug: model.slug,
        })
    }

    pub async fn create(&self, payload: CreatePerson) -> AppResult<PersonDetail> {
        payload.validate()?;
        self.check_countries(&payload.countries).await?;

        let txn = self.db.begin().await?;

        let model = person::ActiveModel {
            id: Default::default(),
            first_name: Set(payload.first_name.clone()),
            last_name: Set(payload.last_name.clone()),
            second_name: Set(payload.second_name.clone()),
            birth_date: Set(payload.birth_date.clone()),
            death_date: Set(payload.death_date.clone()),
            description: Set(payload.description.clone()),
            image: Set(payload.image.clone()),
            slug: Set(String::new()),
        };
        let id = person::Entity::insert(model).exec(&txn).await?.last_insert_id;

        // Slug from first and last name, id-prefixed, written once.
        let (slug, source) =
            slug::assign(id, &format!("{} {}", payload.first_name, payload.last_name));
        person::ActiveModel { id: Unchanged(id), slug: Set(slug), ..Default::default() }
            .update(&txn)
            .await?;
        tracing::debug!(person = id, source = ?source, "assigned person slug");

        replace_countries(&txn, id, &payload.countries).await?;

        txn.commit().await?;

        self.detail(id).await
    }

    /// Full replace of every field except the slug.
    pub async fn update(&self, id: i32, payload: CreatePerson) -> AppResult<PersonDetail> {
        payload.validate()?;
        self.check_countries(&payload.countries).await?;

        if person::Entity::find_by_id(id).one(&self.db).await?.is_none() {
            return Err(AppError::NotFound("person"));
        }

        let txn = self.db.begin().await?;

        person::ActiveModel {
            id: Unchanged(id),
            first_name: Set(payload.first_name.clone()),
            last_name: Set(payload.last_name.clone()),
            second_name: Set(payload.second_name.clone()),
            birth_date: Set(payload.birth_date.clone()),
            death_date: Set(payload.death_date.clone()),
            description: Set(payload.description.clone()),
            image: Set(payload.image.clone()),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        replace_countries(&txn, id, &payload.countries).await?;

        txn.commit().await?;

        self.detail(id).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let txn = self.db.begin().await?;

        if person::Entity::find_by_id(id).one(&txn).await?.is_none() {
            return Err(AppError::NotFound("person"));
        }

        person_country::Entity::delete_many()
            .filter(person_country::Column::PersonId.eq(id))
            .exec(&txn)
            .await?;
        movie_director::Entity::delete_many()
            .filter(movie_director::Column::PersonId.eq(id))
            .exec(&txn)
            .await?;
        movie_actor::Entity::delete_many()
            .filter(movie_actor::Column::PersonId.eq(id))
            .exec(&txn)
            .await?;
        person::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn check_countries(&self, ids: &[i32]) -> AppResult<()> {
        let wanted: BTreeSet<i32> = ids.iter().copied().collect();
        if wanted.is_empty() {
            return Ok(());
        }
        let found = country::Entity::find()
            .filter(country::Column::Id.is_in(wanted.clone()))
            .all(&self.db)
            .await?;
        if found.len() != wanted.len() {
            let mut errors = FieldErrors::new();
            errors.push("countries", "unknown country id");
            return errors.into_result();
        }
        Ok(())
    }
}

async fn replace_countries<C: ConnectionTrait>(
    conn: &C,
    person_id: i32,
    countries: &[i32],
) -> AppResult<()> {
    person_country::Entity::delete_many()
        .filter(person_country::Column::PersonId.eq(person_id))
        .exec(conn)
        .await?;

    let unique: BTreeSet<i32> = countries.iter().copied().collect();
    if !unique.is_empty() {
        person_country::Entity::insert_many(unique.into_iter().map(|country_id| {
            person_country::ActiveModel {
                id: Default::default(),
                person_id: Set(person_id),
                country_id: Set(country_id),
            }
        }))
        .exec(conn)
        .await?;
    }
    Ok(())
}

/// Completed calendar years from birth to death, or to `today` while alive.
fn age_years(birth_date: &str, death_date: Option<&str>, today: Date) -> Option<i32> {
    let birth: Date = birth_date.parse().ok()?;
    let end: Date = match death_date {
        Some(date) => date.parse().ok()?,
        None => today,
    };
    if end < birth {
        return None;
    }
    let mut years = i32::from(end.year()) - i32::from(birth.year());
    if (end.month(), end.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    Some(years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_for_tests;

    fn payload(first: &str, last: &str) -> CreatePerson {
        CreatePerson {
            first_name: first.to_string(),
            last_name: last.to_string(),
            second_name: String::new(),
            birth_date: "1947-07-30".to_string(),
            death_date: None,
            description: "actor".to_string(),
            image: "actors/photo.jpg".to_string(),
            countries: vec![],
        }
    }

    #[tokio::test]
    async fn slug_is_transliterated_and_id_prefixed() {
        let db = connect_for_tests().await;
        let repo = PersonRepo::new(db);

        let created = repo.create(payload("Арнольд", "Шварценеггер")).await.unwrap();
        assert_eq!(created.slug, format!("{}-arnold-shvartsenegger", created.id));
    }

    #[tokio::test]
    async fn slug_survives_renames() {
        let db = connect_for_tests().await;
        let repo = PersonRepo::new(db);

        let created = repo.create(payload("Arnold", "Schwarzenegger")).await.unwrap();
        let original_slug = created.slug.clone();

        let renamed = repo.update(created.id, payload("Arnie", "S")).await.unwrap();
        assert_eq!(renamed.first_name, "Arnie");
        assert_eq!(renamed.slug, original_slug);
    }

    #[tokio::test]
    async fn unknown_country_is_a_validation_error() {
        let db = connect_for_tests().await;
        let repo = PersonRepo::new(db);

        let mut person = payload("Jane", "Doe");
        person.countries = vec![42];
        let err = repo.create(person).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_removes_the_row() {
        let db = connect_for_tests().await;
        let repo = PersonRepo::new(db);

        let created = repo.create(payload("Jane", "Doe")).await.unwrap();
        repo.delete(created.id).await.unwrap();
        assert!(matches!(repo.detail(created.id).await.unwrap_err(), AppError::NotFound(_)));
    }

    #[test]
    fn age_counts_completed_years() {
        let today = "2026-08-06".parse().unwrap();
        assert_eq!(age_years("1947-07-30", None, today), Some(79));
        assert_eq!(age_years("1947-09-01", None, today), Some(78));
        assert_eq!(age_years("1889-04-20", Some("1945-04-30"), today), Some(56));
        assert_eq!(age_years("not-a-date", None, today), None);
    }
}
