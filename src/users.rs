use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{AppError, AppResult, AppState, trips};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ApiUser {
    pub id: String,
    pub username: String,
    pub email: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get_user))
        .route("/{id}/trips", get(user_trips))
}

pub async fn fetch(db_pool: &SqlitePool, user_id: &str) -> AppResult<Option<ApiUser>> {
    Ok(
        sqlx::query_as("SELECT id,username,email FROM users WHERE id=?")
            .bind(user_id)
            .fetch_optional(db_pool)
            .await?,
    )
}

#[debug_handler]
async fn get_user(
    State(db_pool): State<SqlitePool>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiUser>> {
    let user = fetch(&db_pool, &user_id.to_string())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(user))
}

#[debug_handler]
async fn user_trips(
    State(db_pool): State<SqlitePool>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<trips::TripSummary>>> {
    let user_id = user_id.to_string();
    if fetch(&db_pool, &user_id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    Ok(Json(trips::summaries_for_user(&db_pool, &user_id).await?))
}
