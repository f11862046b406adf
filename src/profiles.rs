use axum::{Json, Router, debug_handler, extract::State, routing::get};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{AppError, AppResult, AppState, auth::AuthUser, users, users::ApiUser};

pub fn router() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).post(update_profile))
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    name: String,
    current_location: String,
    age: i64,
    gender: String,
    profession: Option<String>,
}

#[derive(Serialize)]
pub struct ApiProfile {
    pub user: ApiUser,
    pub name: String,
    pub current_location: String,
    pub age: i64,
    pub gender: String,
    pub profession: Option<String>,
}

async fn load(db_pool: &SqlitePool, auth: &AuthUser) -> AppResult<ApiProfile> {
    let row: ProfileRow = sqlx::query_as(
        "SELECT name,current_location,age,gender,profession FROM profiles WHERE user_id=?",
    )
    .bind(&auth.id)
    .fetch_optional(db_pool)
    .await?
    .ok_or(AppError::NotFound)?;
    let user = users::fetch(db_pool, &auth.id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiProfile {
        user,
        name: row.name,
        current_location: row.current_location,
        age: row.age,
        gender: row.gender,
        profession: row.profession,
    })
}

#[debug_handler]
async fn get_profile(
    State(db_pool): State<SqlitePool>,
    auth: AuthUser,
) -> AppResult<Json<ApiProfile>> {
    Ok(Json(load(&db_pool, &auth).await?))
}

#[derive(Deserialize)]
struct UpdateProfileBody {
    name: Option<String>,
    current_location: Option<String>,
    age: Option<i64>,
    gender: Option<String>,
    profession: Option<String>,
}

/// Partial update: absent fields keep their stored values.
#[debug_handler]
async fn update_profile(
    State(db_pool): State<SqlitePool>,
    auth: AuthUser,
    Json(body): Json<UpdateProfileBody>,
) -> AppResult<Json<ApiProfile>> {
    let current = load(&db_pool, &auth).await?;
    sqlx::query(
        "UPDATE profiles SET name=?, current_location=?, age=?, gender=?, profession=? \
         WHERE user_id=?",
    )
    .bind(body.name.unwrap_or(current.name))
    .bind(body.current_location.unwrap_or(current.current_location))
    .bind(body.age.unwrap_or(current.age))
    .bind(body.gender.unwrap_or(current.gender))
    .bind(body.profession.or(current.profession))
    .bind(&auth.id)
    .execute(&db_pool)
    .await?;

    Ok(Json(load(&db_pool, &auth).await?))
}
