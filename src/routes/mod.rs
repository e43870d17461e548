pub mod admin;
pub mod docs;
pub mod movies;
pub mod persons;
pub mod ratings;
pub mod reviews;
pub mod taxonomy;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::AppState;

pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(movies::list_movies).post(movies::create_movie))
        .route(
            "/movies/{id}",
            get(movies::movie_detail).put(movies::update_movie).delete(movies::delete_movie),
        )
        .route("/persons", get(persons::list_persons).post(persons::create_person))
        .route(
            "/persons/{id}",
            get(persons::person_detail).put(persons::update_person).delete(persons::delete_person),
        )
        .route("/reviews", post(reviews::create_review))
        .route("/reviews/{id}", put(reviews::update_review).delete(reviews::delete_review))
        .route("/ratings", post(ratings::create_rating))
        .route("/ratings/{id}", delete(ratings::delete_rating))
        .route("/genres", get(taxonomy::list_genres))
        .route("/categories", get(taxonomy::list_categories))
        .route("/countries", get(taxonomy::list_countries))
        .route("/stars", get(taxonomy::list_stars))
        .route("/openapi.json", get(docs::openapi_json))
        .route("/docs", get(docs::swagger_ui))
        .merge(admin::router())
}
