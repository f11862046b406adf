pub mod auth;
pub mod cities;
pub mod db;
pub mod error;
pub mod profiles;
pub mod trips;
pub mod users;

#[cfg(test)]
pub(crate) mod testutil;

use axum::{Router, extract::FromRef};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::{AppError, AppResult};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
}

pub fn app(app_state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(profiles::router())
        .nest("/cities", cities::router())
        .nest("/users", users::router())
        .nest("/trips", trips::router())
        .nest("/trip-requests", trips::requests_router())
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
