use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::{self, MaybeAuthUser},
    client_ip::ClientIp,
    error::{AppError, AppResult},
    models::CreateRating,
};

#[utoipa::path(
    post,
    path = "/ratings",
    request_body = CreateRating,
    responses((status = 201), (status = 400), (status = 404)),
    tag = "ratings"
)]
pub async fn create_rating(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Json(payload): Json<CreateRating>,
) -> AppResult<StatusCode> {
    state.ratings.upsert(&ip, &payload).await?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    delete,
    path = "/ratings/{id}",
    params(("id" = i32, Path, description = "Rating id")),
    responses((status = 204), (status = 403), (status = 404)),
    tag = "ratings"
)]
pub async fn delete_rating(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
    ClientIp(ip): ClientIp,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let rating = state.ratings.get(id).await?;
    if !auth::may_delete_rating(user.as_ref(), &ip, &rating.ip) {
        return Err(AppError::Forbidden("rating belongs to another address"));
    }
    state.ratings.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
