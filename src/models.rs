use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppResult, FieldErrors};

// Read models. Dates travel as ISO-8601 strings and are validated with jiff
// on the way in.

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct MovieListItem {
    pub id: i32,
    pub title: String,
    pub tagline: String,
    pub year: i32,
    pub poster: String,
    pub slug: String,
    pub category: Option<String>,
    /// Mean of all submitted star values, absent while unrated.
    pub average_rating: Option<f64>,
    pub rated_by_me: bool,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PersonRef {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct MovieShotItem {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub image: String,
}

/// One review with its replies, nested recursively.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ReviewNode {
    pub id: i32,
    pub name: String,
    pub text: String,
    pub children: Vec<ReviewNode>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct MovieDetail {
    pub id: i32,
    pub title: String,
    pub tagline: String,
    pub description: String,
    pub poster: String,
    pub year: i32,
    pub premiere: String,
    pub budget: i64,
    pub fees_in_usa: i64,
    pub fees_in_world: i64,
    pub category: Option<String>,
    pub countries: Vec<String>,
    pub directors: Vec<PersonRef>,
    pub actors: Vec<PersonRef>,
    pub genres: Vec<String>,
    pub shots: Vec<MovieShotItem>,
    pub reviews: Vec<ReviewNode>,
    pub average_rating: Option<f64>,
    pub draft: bool,
    pub slug: String,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PersonListItem {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub slug: String,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PersonDetail {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub second_name: String,
    pub full_name: String,
    pub birth_date: String,
    pub death_date: Option<String>,
    /// Completed years between birth and death, or birth and today.
    pub age: Option<i32>,
    pub description: String,
    pub image: String,
    pub countries: Vec<String>,
    pub slug: String,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct GenreItem {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub slug: String,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct CategoryItem {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub slug: String,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct CountryItem {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct StarItem {
    pub id: i32,
    pub value: i16,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct TokenIssued {
    pub token: String,
    pub email: String,
    pub is_staff: bool,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct UpdatedCount {
    pub updated: u64,
}

// Write payloads.

#[derive(Clone, Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MovieFilter {
    pub year: Option<i32>,
    /// Genre slug.
    pub genre: Option<String>,
    /// Category id.
    pub category: Option<i32>,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct CreateMovie {
    pub title: String,
    #[serde(default)]
    pub tagline: String,
    pub description: String,
    pub poster: String,
    pub year: i32,
    pub premiere: String,
    #[serde(default)]
    pub budget: i64,
    #[serde(default)]
    pub fees_in_usa: i64,
    #[serde(default)]
    pub fees_in_world: i64,
    pub category: Option<i32>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub countries: Vec<i32>,
    #[serde(default)]
    pub directors: Vec<i32>,
    #[serde(default)]
    pub actors: Vec<i32>,
    #[serde(default)]
    pub genres: Vec<i32>,
}

impl CreateMovie {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "title", &self.title, 120);
        max_len(&mut errors, "tagline", &self.tagline, 120);
        require(&mut errors, "description", &self.description, 10_000);
        require(&mut errors, "poster", &self.poster, 255);
        if !(1888..=2100).contains(&self.year) {
            errors.push("year", "out of range");
        }
        check_date(&mut errors, "premiere", &self.premiere);
        for (field, value) in [
            ("budget", self.budget),
            ("fees_in_usa", self.fees_in_usa),
            ("fees_in_world", self.fees_in_world),
        ] {
            if value < 0 {
                errors.push(field, "must not be negative");
            }
        }
        errors.into_result()
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct CreatePerson {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub second_name: String,
    pub birth_date: String,
    pub death_date: Option<String>,
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub countries: Vec<i32>,
}

impl CreatePerson {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "first_name", &self.first_name, 90);
        require(&mut errors, "last_name", &self.last_name, 90);
        max_len(&mut errors, "second_name", &self.second_name, 90);
        require(&mut errors, "image", &self.image, 255);
        let birth = check_date(&mut errors, "birth_date", &self.birth_date);
        if let Some(death) = &self.death_date {
            if let (Some(birth), Some(death)) = (birth, check_date(&mut errors, "death_date", death))
            {
                if death < birth {
                    errors.push("death_date", "before birth date");
                }
            }
        }
        errors.into_result()
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct CreateReview {
    pub movie: i32,
    pub name: String,
    pub email: String,
    pub text: String,
    pub parent: Option<i32>,
}

impl CreateReview {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name, 90);
        check_email(&mut errors, "email", &self.email);
        require(&mut errors, "text", &self.text, 5000);
        errors.into_result()
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct UpdateReview {
    pub name: Option<String>,
    pub text: Option<String>,
}

impl UpdateReview {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            require(&mut errors, "name", name, 90);
        }
        if let Some(text) = &self.text {
            require(&mut errors, "text", text, 5000);
        }
        errors.into_result()
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct CreateRating {
    pub movie: i32,
    /// Star value, not a star row id.
    pub star: i16,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct CreateGenre {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub slug: String,
}

impl CreateGenre {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name, 60);
        check_slug(&mut errors, "slug", &self.slug);
        errors.into_result()
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct CreateCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub slug: String,
}

impl CreateCategory {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name, 150);
        check_slug(&mut errors, "slug", &self.slug);
        errors.into_result()
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct CreateCountry {
    pub name: String,
}

impl CreateCountry {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name, 90);
        errors.into_result()
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct CreateStar {
    pub value: i16,
}

impl CreateStar {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        if !(1..=10).contains(&self.value) {
            errors.push("value", "out of range");
        }
        errors.into_result()
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct CreateShot {
    pub movie: i32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image: String,
}

impl CreateShot {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "title", &self.title, 120);
        require(&mut errors, "image", &self.image, 255);
        errors.into_result()
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct CreateToken {
    pub email: String,
    #[serde(default)]
    pub is_staff: bool,
}

impl CreateToken {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, "email", &self.email);
        errors.into_result()
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct BulkIds {
    pub ids: Vec<i32>,
}

fn require(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.trim().is_empty() {
        errors.push(field, "required");
    } else {
        max_len(errors, field, value, max);
    }
}

fn max_len(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.push(field, format!("longer than {max} characters"));
    }
}

fn check_date(errors: &mut FieldErrors, field: &str, value: &str) -> Option<Date> {
    match value.parse::<Date>() {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(field, "expected an ISO-8601 date");
            None
        },
    }
}

fn check_email(errors: &mut FieldErrors, field: &str, value: &str) {
    let valid = value.len() <= 254
        && value.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty() && !domain.is_empty() && domain.contains('.') && !value.contains(' ')
        });
    if !valid {
        errors.push(field, "not a valid email address");
    }
}

fn check_slug(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.is_empty()
        || !value.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        errors.push(field, "lowercase letters, digits and hyphens only");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review_payload() -> CreateReview {
        CreateReview {
            movie: 1,
            name: "viewer".to_string(),
            email: "viewer@example.com".to_string(),
            text: "great".to_string(),
            parent: None,
        }
    }

    #[test]
    fn review_payload_passes() {
        assert!(review_payload().validate().is_ok());
    }

    #[test]
    fn review_rejects_bad_email_with_field_detail() {
        let mut payload = review_payload();
        payload.email = "not-an-email".to_string();
        let err = payload.validate().unwrap_err();
        match err {
            crate::error::AppError::Validation(fields) => {
                assert!(fields.0.contains_key("email"));
            },
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn review_rejects_text_over_limit() {
        let mut payload = review_payload();
        payload.text = "x".repeat(5001);
        assert!(payload.validate().is_err());
    }

    #[test]
    fn movie_rejects_malformed_premiere_date() {
        let payload = CreateMovie {
            title: "Alien".to_string(),
            tagline: String::new(),
            description: "In space no one can hear you scream.".to_string(),
            poster: "movies/alien.jpg".to_string(),
            year: 1979,
            premiere: "1979-13-40".to_string(),
            budget: 0,
            fees_in_usa: 0,
            fees_in_world: 0,
            category: None,
            draft: false,
            countries: vec![],
            directors: vec![],
            actors: vec![],
            genres: vec![],
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn person_rejects_death_before_birth() {
        let payload = CreatePerson {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            second_name: String::new(),
            birth_date: "1960-05-01".to_string(),
            death_date: Some("1950-01-01".to_string()),
            description: String::new(),
            image: "actors/doe.jpg".to_string(),
            countries: vec![],
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn slug_format_is_checked() {
        let payload = CreateGenre {
            name: "Horror".to_string(),
            description: String::new(),
            slug: "Horror Movies".to_string(),
        };
        assert!(payload.validate().is_err());
    }
}
