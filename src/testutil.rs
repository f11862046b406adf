use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use uuid::Uuid;

use crate::{db, trips::Trip, trips::join::JoinRequest};

/// A single connection: every in-memory SQLite connection is its own
/// database, so the pool must never grow past one.
pub(crate) async fn pool() -> SqlitePool {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init(&db_pool).await.unwrap();
    db_pool
}

pub(crate) async fn user(db_pool: &SqlitePool, username: &str) -> String {
    let id = Uuid::now_v7().to_string();
    sqlx::query("INSERT INTO users (id,username,email,password_hash,created_at) VALUES (?,?,?,?,?)")
        .bind(&id)
        .bind(username)
        .bind(format!("{username}@example.com"))
        .bind("x")
        .bind(db::now())
        .execute(db_pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO profiles (user_id,name) VALUES (?,?)")
        .bind(&id)
        .bind(username)
        .execute(db_pool)
        .await
        .unwrap();
    id
}

pub(crate) async fn city(db_pool: &SqlitePool, name: &str) -> String {
    let id = Uuid::now_v7().to_string();
    sqlx::query("INSERT INTO cities (id,name) VALUES (?,?)")
        .bind(&id)
        .bind(name)
        .execute(db_pool)
        .await
        .unwrap();
    id
}

pub(crate) async fn trip(db_pool: &SqlitePool, host_id: &str) -> Trip {
    let city_id = city(db_pool, "Lisbon").await;
    let id = Uuid::now_v7().to_string();
    sqlx::query(
        "INSERT INTO trips (id,host_id,group_name,city_id,start_date,end_date,description,\
         min_age,max_age,required_members,created_at) VALUES (?,?,?,?,?,?,?,?,?,?,?)",
    )
    .bind(&id)
    .bind(host_id)
    .bind("Lisbon crew")
    .bind(&city_id)
    .bind("2026-09-01")
    .bind("2026-09-07")
    .bind("a week on the coast")
    .bind(21)
    .bind(35)
    .bind(4)
    .bind(db::now())
    .execute(db_pool)
    .await
    .unwrap();

    crate::trips::fetch(db_pool, &id).await.unwrap().unwrap()
}

pub(crate) async fn request_for(db_pool: &SqlitePool, trip_id: &str, user_id: &str) -> JoinRequest {
    sqlx::query_as(
        "SELECT id,trip_id,user_id,status,created_at FROM join_requests \
         WHERE trip_id=? AND user_id=?",
    )
    .bind(trip_id)
    .bind(user_id)
    .fetch_one(db_pool)
    .await
    .unwrap()
}
