use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    AppState,
    error::AppResult,
    models::{CategoryItem, CountryItem, GenreItem, StarItem},
};

#[utoipa::path(get, path = "/genres", responses((status = 200, body = [GenreItem])), tag = "lookups")]
pub async fn list_genres(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<GenreItem>>> {
    Ok(Json(state.taxonomy.list_genres().await?))
}

#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, body = [CategoryItem])),
    tag = "lookups"
)]
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<CategoryItem>>> {
    Ok(Json(state.taxonomy.list_categories().await?))
}

#[utoipa::path(
    get,
    path = "/countries",
    responses((status = 200, body = [CountryItem])),
    tag = "lookups"
)]
pub async fn list_countries(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<CountryItem>>> {
    Ok(Json(state.taxonomy.list_countries().await?))
}

#[utoipa::path(get, path = "/stars", responses((status = 200, body = [StarItem])), tag = "lookups")]
pub async fn list_stars(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<StarItem>>> {
    let stars = state.ratings.stars().await?;
    Ok(Json(stars.into_iter().map(|s| StarItem { id: s.id, value: s.value }).collect()))
}
