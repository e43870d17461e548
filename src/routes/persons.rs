use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::AuthUser,
    error::AppResult,
    models::{CreatePerson, PersonDetail, PersonListItem},
};

#[utoipa::path(
    get,
    path = "/persons",
    responses((status = 200, body = [PersonListItem])),
    tag = "persons"
)]
pub async fn list_persons(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<PersonListItem>>> {
    Ok(Json(state.persons.list().await?))
}

#[utoipa::path(
    get,
    path = "/persons/{id}",
    params(("id" = i32, Path, description = "Person id")),
    responses((status = 200, body = PersonDetail), (status = 404)),
    tag = "persons"
)]
pub async fn person_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<PersonDetail>> {
    Ok(Json(state.persons.detail(id).await?))
}

#[utoipa::path(
    post,
    path = "/persons",
    request_body = CreatePerson,
    responses((status = 201, body = PersonDetail), (status = 400), (status = 401)),
    tag = "persons"
)]
pub async fn create_person(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(payload): Json<CreatePerson>,
) -> AppResult<(StatusCode, Json<PersonDetail>)> {
    let created = state.persons.create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/persons/{id}",
    params(("id" = i32, Path, description = "Person id")),
    request_body = CreatePerson,
    responses((status = 200, body = PersonDetail), (status = 403), (status = 404)),
    tag = "persons"
)]
pub async fn update_person(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CreatePerson>,
) -> AppResult<Json<PersonDetail>> {
    user.require_staff()?;
    Ok(Json(state.persons.update(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/persons/{id}",
    params(("id" = i32, Path, description = "Person id")),
    responses((status = 204), (status = 403), (status = 404)),
    tag = "persons"
)]
pub async fn delete_person(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    user.require_staff()?;
    state.persons.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
