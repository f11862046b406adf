use axum::{Json, debug_handler, extract::State};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{AppError, AppResult, users};

use super::{AuthResponse, issue_token, verify_password};

#[derive(Deserialize)]
pub(crate) struct LoginBody {
    username: String,
    password: String,
}

#[debug_handler]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    Json(LoginBody { username, password }): Json<LoginBody>,
) -> AppResult<Json<AuthResponse>> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT id,password_hash FROM users WHERE username=?")
            .bind(&username)
            .fetch_optional(&db_pool)
            .await?;

    let Some((user_id, password_hash)) = row else {
        return Err(AppError::InvalidCredentials);
    };
    if !verify_password(&password, &password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(&db_pool, &user_id).await?;
    let user = users::fetch(&db_pool, &user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(AuthResponse { token, user }))
}
