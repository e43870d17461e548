use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post, put},
};

use crate::{
    AppState,
    auth::AuthUser,
    error::AppResult,
    models::{
        BulkIds, CategoryItem, CountryItem, CreateCategory, CreateCountry, CreateGenre, CreateShot,
        CreateStar, CreateToken, GenreItem, MovieShotItem, StarItem, TokenIssued, UpdatedCount,
    },
};

/// Staff-only management surface. Every handler checks the staff flag
/// itself, so a plain token gets a 403 rather than a missing route.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/movies/publish", post(publish_movies))
        .route("/admin/movies/unpublish", post(unpublish_movies))
        .route("/admin/genres", post(create_genre))
        .route("/admin/genres/{id}", put(update_genre).delete(delete_genre))
        .route("/admin/categories", post(create_category))
        .route("/admin/categories/{id}", put(update_category).delete(delete_category))
        .route("/admin/countries", post(create_country))
        .route("/admin/countries/{id}", delete(delete_country))
        .route("/admin/stars", post(create_star))
        .route("/admin/stars/{id}", delete(delete_star))
        .route("/admin/shots", post(create_shot))
        .route("/admin/shots/{id}", delete(delete_shot))
        .route("/admin/tokens", post(issue_token))
        .route("/admin/tokens/{token}", delete(revoke_token))
}

pub async fn publish_movies(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<BulkIds>,
) -> AppResult<Json<UpdatedCount>> {
    user.require_staff()?;
    let updated = state.movies.set_draft(&payload.ids, false).await?;
    tracing::info!(updated, "published movies");
    Ok(Json(UpdatedCount { updated }))
}

pub async fn unpublish_movies(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<BulkIds>,
) -> AppResult<Json<UpdatedCount>> {
    user.require_staff()?;
    let updated = state.movies.set_draft(&payload.ids, true).await?;
    tracing::info!(updated, "unpublished movies");
    Ok(Json(UpdatedCount { updated }))
}

pub async fn create_genre(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateGenre>,
) -> AppResult<(StatusCode, Json<GenreItem>)> {
    user.require_staff()?;
    Ok((StatusCode::CREATED, Json(state.taxonomy.create_genre(payload).await?)))
}

pub async fn update_genre(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CreateGenre>,
) -> AppResult<Json<GenreItem>> {
    user.require_staff()?;
    Ok(Json(state.taxonomy.update_genre(id, payload).await?))
}

pub async fn delete_genre(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    user.require_staff()?;
    state.taxonomy.delete_genre(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateCategory>,
) -> AppResult<(StatusCode, Json<CategoryItem>)> {
    user.require_staff()?;
    Ok((StatusCode::CREATED, Json(state.taxonomy.create_category(payload).await?)))
}

pub async fn update_category(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CreateCategory>,
) -> AppResult<Json<CategoryItem>> {
    user.require_staff()?;
    Ok(Json(state.taxonomy.update_category(id, payload).await?))
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    user.require_staff()?;
    state.taxonomy.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_country(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateCountry>,
) -> AppResult<(StatusCode, Json<CountryItem>)> {
    user.require_staff()?;
    Ok((StatusCode::CREATED, Json(state.taxonomy.create_country(payload).await?)))
}

pub async fn delete_country(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    user.require_staff()?;
    state.taxonomy.delete_country(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_star(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateStar>,
) -> AppResult<(StatusCode, Json<StarItem>)> {
    user.require_staff()?;
    Ok((StatusCode::CREATED, Json(state.taxonomy.create_star(payload).await?)))
}

pub async fn delete_star(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    user.require_staff()?;
    state.taxonomy.delete_star(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_shot(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateShot>,
) -> AppResult<(StatusCode, Json<MovieShotItem>)> {
    user.require_staff()?;
    Ok((StatusCode::CREATED, Json(state.taxonomy.create_shot(payload).await?)))
}

pub async fn delete_shot(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    user.require_staff()?;
    state.taxonomy.delete_shot(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateToken>,
) -> AppResult<(StatusCode, Json<TokenIssued>)> {
    user.require_staff()?;
    let issued = state.tokens.issue(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(TokenIssued { token: issued.token, email: issued.email, is_staff: issued.is_staff }),
    ))
}

pub async fn revoke_token(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(token): Path<String>,
) -> AppResult<StatusCode> {
    user.require_staff()?;
    state.tokens.revoke(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}
