use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{CreateReview, UpdateReview},
};

#[utoipa::path(
    post,
    path = "/reviews",
    request_body = CreateReview,
    responses((status = 201), (status = 400), (status = 404)),
    tag = "reviews"
)]
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateReview>,
) -> AppResult<StatusCode> {
    state.reviews.create(payload).await?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    put,
    path = "/reviews/{id}",
    params(("id" = i32, Path, description = "Review id")),
    request_body = UpdateReview,
    responses((status = 204), (status = 401), (status = 403), (status = 404)),
    tag = "reviews"
)]
pub async fn update_review(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateReview>,
) -> AppResult<StatusCode> {
    let review = state.reviews.get(id).await?;
    if !user.may_edit_review(&review.email) {
        return Err(AppError::Forbidden("review belongs to another email"));
    }
    state.reviews.update(id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/reviews/{id}",
    params(("id" = i32, Path, description = "Review id")),
    responses((status = 204), (status = 401), (status = 403), (status = 404)),
    tag = "reviews"
)]
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let review = state.reviews.get(id).await?;
    if !user.may_edit_review(&review.email) {
        return Err(AppError::Forbidden("review belongs to another email"));
    }
    state.reviews.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
