mod auth;
mod client_ip;
mod config;
mod db;
mod entities;
mod error;
mod models;
mod openapi;
mod repo;
mod review_tree;
mod routes;
mod slug;

use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    config::Config,
    repo::{MovieRepo, PersonRepo, RatingRepo, ReviewRepo, TaxonomyRepo, TokenRepo},
};

/// Repositories are constructed once here and shared through the router
/// state; nothing else holds a database handle.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub movies: MovieRepo,
    pub persons: PersonRepo,
    pub reviews: ReviewRepo,
    pub ratings: RatingRepo,
    pub taxonomy: TaxonomyRepo,
    pub tokens: TokenRepo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,kinoteka=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let db = db::connect_and_migrate(&config.database_url).await?;

    let state = Arc::new(AppState {
        config: config.clone(),
        movies: MovieRepo::new(db.clone()),
        persons: PersonRepo::new(db.clone()),
        reviews: ReviewRepo::new(db.clone()),
        ratings: RatingRepo::new(db.clone()),
        taxonomy: TaxonomyRepo::new(db.clone()),
        tokens: TokenRepo::new(db),
    });

    let app = Router::new()
        .merge(routes::api_router())
        .nest_service("/media", ServeDir::new(&config.media_root))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
