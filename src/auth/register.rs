use axum::{Json, debug_handler, extract::State, http::StatusCode};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::{AppError, AppResult, db, users};

use super::{AuthResponse, hash_password, issue_token};

#[derive(Deserialize)]
pub(crate) struct RegisterBody {
    username: String,
    email: String,
    password1: String,
    password2: String,
}

#[debug_handler]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    Json(body): Json<RegisterBody>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let username = body.username.trim();
    if username.is_empty() {
        return Err(AppError::invalid("This field may not be blank."));
    }
    if body.password1 != body.password2 {
        return Err(AppError::invalid("Password fields didn't match."));
    }
    if body.password1.len() < 8 {
        return Err(AppError::invalid(
            "This password is too short. It must contain at least 8 characters.",
        ));
    }

    let user_id = Uuid::now_v7().to_string();
    let password_hash = hash_password(&body.password1)?;

    let inserted =
        sqlx::query("INSERT INTO users (id,username,email,password_hash,created_at) VALUES (?,?,?,?,?)")
            .bind(&user_id)
            .bind(username)
            .bind(&body.email)
            .bind(&password_hash)
            .bind(db::now())
            .execute(&db_pool)
            .await;
    if let Err(e) = inserted {
        if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
            return Err(AppError::UsernameTaken);
        }
        return Err(e.into());
    }

    // every account starts with an empty profile, filled in later
    sqlx::query("INSERT INTO profiles (user_id) VALUES (?)")
        .bind(&user_id)
        .execute(&db_pool)
        .await?;

    let token = issue_token(&db_pool, &user_id).await?;
    info!("registered u/{username}");

    let user = users::fetch(&db_pool, &user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}
