use axum::{
    Json, debug_handler,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{AppError, AppResult, auth::AuthUser};

use super::{ApiTrip, Trip, TripSummary, join, membership};

async fn fetch_or_404(db_pool: &SqlitePool, trip_id: Uuid) -> AppResult<Trip> {
    super::fetch(db_pool, &trip_id.to_string())
        .await?
        .ok_or(AppError::NotFound)
}

#[debug_handler]
pub(crate) async fn list_trips(
    State(db_pool): State<SqlitePool>,
) -> AppResult<Json<Vec<TripSummary>>> {
    Ok(Json(super::summaries(&db_pool).await?))
}

#[debug_handler]
pub(crate) async fn get_trip(
    State(db_pool): State<SqlitePool>,
    Path(trip_id): Path<Uuid>,
) -> AppResult<Json<ApiTrip>> {
    let trip = fetch_or_404(&db_pool, trip_id).await?;
    Ok(Json(super::api_trip(&db_pool, &trip).await?))
}

#[debug_handler]
pub(crate) async fn delete_trip(
    State(db_pool): State<SqlitePool>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let trip = fetch_or_404(&db_pool, trip_id).await?;
    if trip.host_id != auth.id {
        return Err(AppError::Forbidden);
    }

    let mut tx = db_pool.begin().await?;
    for table in ["messages", "join_requests", "trip_members", "trip_itinerary"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE trip_id=?"))
            .bind(&trip.id)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("DELETE FROM trips WHERE id=?")
        .bind(&trip.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[debug_handler]
pub(crate) async fn join_request(
    State(db_pool): State<SqlitePool>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let trip = fetch_or_404(&db_pool, trip_id).await?;
    join::request_join(&db_pool, &trip, &auth.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "detail": "Join request sent successfully." })),
    ))
}

#[debug_handler]
pub(crate) async fn join_status(
    State(db_pool): State<SqlitePool>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let trip = fetch_or_404(&db_pool, trip_id).await?;
    let status = membership::evaluate(&db_pool, &trip, &auth.id).await?;
    Ok(Json(json!({ "status": status })))
}
