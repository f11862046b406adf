use axum::{
    Json, debug_handler,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{AppError, AppResult, auth::AuthUser, db};

use super::{Trip, membership, membership::Membership};

/// The functional reason membership state exists: only hosts and admitted
/// members may see or write the chat stream.
pub async fn can_access(db_pool: &SqlitePool, trip: &Trip, user_id: &str) -> AppResult<bool> {
    Ok(matches!(
        membership::evaluate(db_pool, trip, user_id).await?,
        Membership::Host | Membership::Member
    ))
}

#[derive(Serialize)]
pub struct MessageAuthor {
    pub id: String,
    pub username: String,
}

#[derive(Serialize)]
pub struct ApiMessage {
    pub id: String,
    pub user: MessageAuthor,
    pub message: String,
    pub timestamp: i64,
}

async fn gated_trip(db_pool: &SqlitePool, trip_id: Uuid, user_id: &str) -> AppResult<Trip> {
    let trip = super::fetch(db_pool, &trip_id.to_string())
        .await?
        .ok_or(AppError::NotFound)?;
    if !can_access(db_pool, &trip, user_id).await? {
        return Err(AppError::Forbidden);
    }
    Ok(trip)
}

#[debug_handler]
pub(crate) async fn list_chat(
    State(db_pool): State<SqlitePool>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
) -> AppResult<Json<Vec<ApiMessage>>> {
    let trip = gated_trip(&db_pool, trip_id, &auth.id).await?;

    // timestamp resolution is seconds; the v7 id breaks ties in insert order
    let rows: Vec<(String, String, String, String, i64)> = sqlx::query_as(
        "SELECT m.id, u.id, u.username, m.message, m.created_at \
         FROM messages m JOIN users u ON u.id = m.user_id \
         WHERE m.trip_id = ? ORDER BY m.created_at ASC, m.id ASC",
    )
    .bind(&trip.id)
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(
        rows.into_iter()
            .map(|(id, user_id, username, message, timestamp)| ApiMessage {
                id,
                user: MessageAuthor {
                    id: user_id,
                    username,
                },
                message,
                timestamp,
            })
            .collect(),
    ))
}

#[derive(Deserialize)]
pub(crate) struct PostMessageBody {
    message: String,
}

#[debug_handler]
pub(crate) async fn post_chat(
    State(db_pool): State<SqlitePool>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(PostMessageBody { message }): Json<PostMessageBody>,
) -> AppResult<(StatusCode, Json<ApiMessage>)> {
    let trip = gated_trip(&db_pool, trip_id, &auth.id).await?;

    if message.trim().is_empty() {
        return Err(AppError::invalid("This field may not be blank."));
    }

    let id = Uuid::now_v7().to_string();
    let timestamp = db::now();
    sqlx::query("INSERT INTO messages (id,trip_id,user_id,message,created_at) VALUES (?,?,?,?,?)")
        .bind(&id)
        .bind(&trip.id)
        .bind(&auth.id)
        .bind(&message)
        .bind(timestamp)
        .execute(&db_pool)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiMessage {
            id,
            user: MessageAuthor {
                id: auth.id,
                username: auth.username,
            },
            message,
            timestamp,
        }),
    ))
}
