pub mod chat;
pub mod join;
pub mod membership;
mod new;
mod requests;
mod trip;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{AppResult, AppState, cities::ApiCity, users::ApiUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(trip::list_trips).post(new::create_trip))
        .route("/{id}", get(trip::get_trip).delete(trip::delete_trip))
        .route("/{id}/join-request", post(trip::join_request))
        .route("/{id}/join-status", get(trip::join_status))
        .route("/{id}/chat", get(chat::list_chat).post(chat::post_chat))
}

pub fn requests_router() -> Router<AppState> {
    requests::router()
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Trip {
    pub id: String,
    pub host_id: String,
    pub group_name: String,
    pub city_id: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    pub min_age: i64,
    pub max_age: i64,
    pub required_members: i64,
    pub created_at: i64,
}

pub async fn fetch(db_pool: &SqlitePool, trip_id: &str) -> AppResult<Option<Trip>> {
    Ok(sqlx::query_as(
        "SELECT id,host_id,group_name,city_id,start_date,end_date,description,\
         min_age,max_age,required_members,created_at FROM trips WHERE id=?",
    )
    .bind(trip_id)
    .fetch_optional(db_pool)
    .await?)
}

#[derive(Serialize)]
pub struct ItineraryItem {
    pub day: i64,
    pub description: String,
}

/// Full trip representation: host, destination, members and itinerary
/// resolved. Used for detail responses and as the creation response body.
#[derive(Serialize)]
pub struct ApiTrip {
    pub id: String,
    pub host: ApiUser,
    pub group_name: String,
    pub destination: ApiCity,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    pub min_age: i64,
    pub max_age: i64,
    pub required_members: i64,
    pub members: Vec<ApiUser>,
    pub itinerary_items: Vec<ItineraryItem>,
    pub current_members_count: i64,
    pub created_at: i64,
}

pub async fn api_trip(db_pool: &SqlitePool, trip: &Trip) -> AppResult<ApiTrip> {
    let host = crate::users::fetch(db_pool, &trip.host_id)
        .await?
        .ok_or(crate::AppError::NotFound)?;
    let destination: ApiCity = sqlx::query_as("SELECT id,name FROM cities WHERE id=?")
        .bind(&trip.city_id)
        .fetch_one(db_pool)
        .await?;
    let members: Vec<ApiUser> = sqlx::query_as(
        "SELECT u.id,u.username,u.email FROM trip_members m \
         JOIN users u ON u.id = m.user_id WHERE m.trip_id=? ORDER BY u.username",
    )
    .bind(&trip.id)
    .fetch_all(db_pool)
    .await?;
    let itinerary_items: Vec<(i64, String)> =
        sqlx::query_as("SELECT day,description FROM trip_itinerary WHERE trip_id=? ORDER BY day")
            .bind(&trip.id)
            .fetch_all(db_pool)
            .await?;

    // host is counted implicitly, never stored as an edge
    let current_members_count = members.len() as i64 + 1;

    Ok(ApiTrip {
        id: trip.id.clone(),
        host,
        group_name: trip.group_name.clone(),
        destination,
        start_date: trip.start_date.clone(),
        end_date: trip.end_date.clone(),
        description: trip.description.clone(),
        min_age: trip.min_age,
        max_age: trip.max_age,
        required_members: trip.required_members,
        members,
        itinerary_items: itinerary_items
            .into_iter()
            .map(|(day, description)| ItineraryItem { day, description })
            .collect(),
        current_members_count,
        created_at: trip.created_at,
    })
}

/// Compact listing row, denormalized in one query.
#[derive(Serialize, sqlx::FromRow)]
pub struct TripSummary {
    pub id: String,
    pub group_name: String,
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub min_age: i64,
    pub max_age: i64,
    pub required_members: i64,
    pub current_members_count: i64,
    pub created_at: i64,
}

const SUMMARY_SELECT: &str = "SELECT t.id, t.group_name, c.name AS destination, \
     t.start_date, t.end_date, t.min_age, t.max_age, t.required_members, \
     (SELECT COUNT(*) FROM trip_members m WHERE m.trip_id = t.id) + 1 AS current_members_count, \
     t.created_at FROM trips t JOIN cities c ON c.id = t.city_id";

pub async fn summaries(db_pool: &SqlitePool) -> AppResult<Vec<TripSummary>> {
    Ok(
        sqlx::query_as(&format!("{SUMMARY_SELECT} ORDER BY t.created_at DESC, t.id DESC"))
            .fetch_all(db_pool)
            .await?,
    )
}

pub async fn summaries_for_city(db_pool: &SqlitePool, city_id: &str) -> AppResult<Vec<TripSummary>> {
    Ok(sqlx::query_as(&format!(
        "{SUMMARY_SELECT} WHERE t.city_id=? ORDER BY t.created_at DESC, t.id DESC"
    ))
    .bind(city_id)
    .fetch_all(db_pool)
    .await?)
}

/// Trips the user hosts or has been admitted to.
pub async fn summaries_for_user(db_pool: &SqlitePool, user_id: &str) -> AppResult<Vec<TripSummary>> {
    Ok(sqlx::query_as(&format!(
        "{SUMMARY_SELECT} WHERE t.host_id=? \
         OR t.id IN (SELECT trip_id FROM trip_members WHERE user_id=?) \
         ORDER BY t.created_at DESC, t.id DESC"
    ))
    .bind(user_id)
    .bind(user_id)
    .fetch_all(db_pool)
    .await?)
}
