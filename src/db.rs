use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

use crate::AppResult;

pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(16)
        .connect(url)
        .await
}

/// Unix seconds; all record timestamps use this resolution. Ordering ties
/// are broken by the time-ordered v7 id.
pub fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS tokens (
        token TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id),
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS profiles (
        user_id TEXT PRIMARY KEY REFERENCES users(id),
        name TEXT NOT NULL DEFAULT '',
        current_location TEXT NOT NULL DEFAULT '',
        age INTEGER NOT NULL DEFAULT 0,
        gender TEXT NOT NULL DEFAULT '',
        profession TEXT
    )",
    "CREATE TABLE IF NOT EXISTS cities (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS trips (
        id TEXT PRIMARY KEY,
        host_id TEXT NOT NULL REFERENCES users(id),
        group_name TEXT NOT NULL,
        city_id TEXT NOT NULL REFERENCES cities(id),
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        description TEXT NOT NULL,
        min_age INTEGER NOT NULL,
        max_age INTEGER NOT NULL,
        required_members INTEGER NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS trip_itinerary (
        trip_id TEXT NOT NULL REFERENCES trips(id),
        day INTEGER NOT NULL,
        description TEXT NOT NULL,
        PRIMARY KEY (trip_id, day)
    )",
    // the host is never inserted here; host membership is implicit
    "CREATE TABLE IF NOT EXISTS trip_members (
        trip_id TEXT NOT NULL REFERENCES trips(id),
        user_id TEXT NOT NULL REFERENCES users(id),
        PRIMARY KEY (trip_id, user_id)
    )",
    // UNIQUE(trip_id, user_id) collapses racing first-time join requests
    // into a single row
    "CREATE TABLE IF NOT EXISTS join_requests (
        id TEXT PRIMARY KEY,
        trip_id TEXT NOT NULL REFERENCES trips(id),
        user_id TEXT NOT NULL REFERENCES users(id),
        status TEXT NOT NULL DEFAULT 'pending',
        created_at INTEGER NOT NULL,
        UNIQUE (trip_id, user_id)
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        trip_id TEXT NOT NULL REFERENCES trips(id),
        user_id TEXT NOT NULL REFERENCES users(id),
        message TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
];

pub async fn init(db_pool: &SqlitePool) -> AppResult<()> {
    for stmt in SCHEMA {
        sqlx::query(stmt).execute(db_pool).await?;
    }
    Ok(())
}
