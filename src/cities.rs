use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{AppError, AppResult, AppState, trips};

/// Read-only destination catalog; rows are seeded out of band.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ApiCity {
    pub id: String,
    pub name: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cities))
        .route("/{id}", get(get_city))
        .route("/{id}/trips", get(city_trips))
}

#[debug_handler]
async fn list_cities(State(db_pool): State<SqlitePool>) -> AppResult<Json<Vec<ApiCity>>> {
    Ok(Json(
        sqlx::query_as("SELECT id,name FROM cities ORDER BY name")
            .fetch_all(&db_pool)
            .await?,
    ))
}

#[debug_handler]
async fn get_city(
    State(db_pool): State<SqlitePool>,
    Path(city_id): Path<Uuid>,
) -> AppResult<Json<ApiCity>> {
    let city: Option<ApiCity> = sqlx::query_as("SELECT id,name FROM cities WHERE id=?")
        .bind(city_id.to_string())
        .fetch_optional(&db_pool)
        .await?;
    Ok(Json(city.ok_or(AppError::NotFound)?))
}

#[debug_handler]
async fn city_trips(
    State(db_pool): State<SqlitePool>,
    Path(city_id): Path<Uuid>,
) -> AppResult<Json<Vec<trips::TripSummary>>> {
    Ok(Json(
        trips::summaries_for_city(&db_pool, &city_id.to_string()).await?,
    ))
}
