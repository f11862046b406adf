mod login;
mod register;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json, Router,
    extract::{FromRef, FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
};
use rand::RngCore;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{AppError, AppResult, AppState, db, users::ApiUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register::register))
        .route("/auth/login", post(login::login))
        .route("/auth/user", get(current_user))
}

/// An authenticated caller. Resolving the bearer token happens here, at the
/// edge; everything past this point takes the identity as a plain argument.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    SqlitePool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AppError::MissingToken)?
            .to_str()
            .map_err(|_| AppError::InvalidToken)?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("Token "))
            .ok_or(AppError::InvalidToken)?;

        let db_pool = SqlitePool::from_ref(state);
        let row: Option<(String, String)> = sqlx::query_as(
            "SELECT users.id, users.username FROM tokens \
             JOIN users ON users.id = tokens.user_id WHERE tokens.token = ?",
        )
        .bind(token)
        .fetch_optional(&db_pool)
        .await?;

        let (id, username) = row.ok_or(AppError::InvalidToken)?;
        Ok(AuthUser { id, username })
    }
}

#[derive(Serialize)]
pub(crate) struct AuthResponse {
    pub(crate) token: String,
    pub(crate) user: ApiUser,
}

/// One reusable token per user; a fresh one is minted on first issue.
pub(crate) async fn issue_token(db_pool: &SqlitePool, user_id: &str) -> AppResult<String> {
    let existing: Option<(String,)> = sqlx::query_as("SELECT token FROM tokens WHERE user_id=?")
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    if let Some((token,)) = existing {
        return Ok(token);
    }

    let mut bytes = [0u8; 20];
    rand::rng().fill_bytes(&mut bytes);
    let token: String = bytes.iter().map(|b| format!("{b:02x}")).collect();

    sqlx::query("INSERT INTO tokens (token,user_id,created_at) VALUES (?,?,?)")
        .bind(&token)
        .bind(user_id)
        .bind(db::now())
        .execute(db_pool)
        .await?;
    Ok(token)
}

pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

pub(crate) fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

async fn current_user(
    State(db_pool): State<SqlitePool>,
    auth: AuthUser,
) -> AppResult<Json<ApiUser>> {
    let user = crate::users::fetch(&db_pool, &auth.id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(user))
}
