use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::AuthUser,
    client_ip::ClientIp,
    error::AppResult,
    models::{CreateMovie, MovieDetail, MovieFilter, MovieListItem},
};

#[utoipa::path(
    get,
    path = "/movies",
    params(MovieFilter),
    responses((status = 200, body = [MovieListItem])),
    tag = "movies"
)]
pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Query(filter): Query<MovieFilter>,
) -> AppResult<Json<Vec<MovieListItem>>> {
    Ok(Json(state.movies.list(&filter, &ip).await?))
}

#[utoipa::path(
    get,
    path = "/movies/{id}",
    params(("id" = i32, Path, description = "Movie id")),
    responses((status = 200, body = MovieDetail), (status = 404)),
    tag = "movies"
)]
pub async fn movie_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<MovieDetail>> {
    Ok(Json(state.movies.detail(id).await?))
}

#[utoipa::path(
    post,
    path = "/movies",
    request_body = CreateMovie,
    responses((status = 201, body = MovieDetail), (status = 400), (status = 401)),
    tag = "movies"
)]
pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(payload): Json<CreateMovie>,
) -> AppResult<(StatusCode, Json<MovieDetail>)> {
    let created = state.movies.create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/movies/{id}",
    params(("id" = i32, Path, description = "Movie id")),
    request_body = CreateMovie,
    responses((status = 200, body = MovieDetail), (status = 403), (status = 404)),
    tag = "movies"
)]
pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CreateMovie>,
) -> AppResult<Json<MovieDetail>> {
    user.require_staff()?;
    Ok(Json(state.movies.update(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/movies/{id}",
    params(("id" = i32, Path, description = "Movie id")),
    responses((status = 204), (status = 403), (status = 404)),
    tag = "movies"
)]
pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    user.require_staff()?;
    state.movies.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
