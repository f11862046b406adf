use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    routing::{get, post},
};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{AppError, AppResult, AppState, auth::AuthUser};

use super::join;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(inbox))
        .route("/{id}/approve", post(approve_request))
        .route("/{id}/reject", post(reject_request))
}

#[debug_handler]
async fn inbox(
    State(db_pool): State<SqlitePool>,
    auth: AuthUser,
) -> AppResult<Json<Vec<join::InboxEntry>>> {
    Ok(Json(join::pending_for_host(&db_pool, &auth.id).await?))
}

/// Transitions are host-only; the request must belong to a trip the caller
/// hosts.
async fn owned_request(
    db_pool: &SqlitePool,
    auth: &AuthUser,
    request_id: Uuid,
) -> AppResult<join::JoinRequest> {
    let request = join::fetch(db_pool, &request_id.to_string())
        .await?
        .ok_or(AppError::NotFound)?;
    let trip = super::fetch(db_pool, &request.trip_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if trip.host_id != auth.id {
        return Err(AppError::Forbidden);
    }
    Ok(request)
}

#[debug_handler]
async fn approve_request(
    State(db_pool): State<SqlitePool>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let request = owned_request(&db_pool, &auth, request_id).await?;
    join::approve(&db_pool, &request).await?;
    Ok(Json(json!({ "detail": "Join request approved." })))
}

#[debug_handler]
async fn reject_request(
    State(db_pool): State<SqlitePool>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let request = owned_request(&db_pool, &auth, request_id).await?;
    join::reject(&db_pool, &request).await?;
    Ok(Json(json!({ "detail": "Join request rejected." })))
}
