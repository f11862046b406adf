use axum::{Json, debug_handler, extract::State, http::StatusCode};
use serde::Deserialize;
use sqlx::SqlitePool;
use time::{Date, macros::format_description};
use tracing::info;
use uuid::Uuid;

use crate::{AppError, AppResult, auth::AuthUser, db};

use super::ApiTrip;

#[derive(Deserialize)]
pub(crate) struct ItineraryItemBody {
    day: i64,
    description: String,
}

#[derive(Deserialize)]
pub(crate) struct CreateTripBody {
    group_name: String,
    destination_id: Uuid,
    start_date: String,
    end_date: String,
    description: String,
    min_age: i64,
    max_age: i64,
    required_members: i64,
    #[serde(default)]
    itinerary: Vec<ItineraryItemBody>,
}

fn parse_date(s: &str, field: &str) -> AppResult<Date> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(s, format)
        .map_err(|_| AppError::invalid(format!("{field}: Date has wrong format. Use YYYY-MM-DD.")))
}

#[debug_handler]
pub(crate) async fn create_trip(
    State(db_pool): State<SqlitePool>,
    auth: AuthUser,
    Json(body): Json<CreateTripBody>,
) -> AppResult<(StatusCode, Json<ApiTrip>)> {
    if body.group_name.trim().is_empty() {
        return Err(AppError::invalid("group_name: This field may not be blank."));
    }
    let start = parse_date(&body.start_date, "start_date")?;
    let end = parse_date(&body.end_date, "end_date")?;
    // storage does not enforce this, so creation must
    if start > end {
        return Err(AppError::invalid(
            "start_date must be on or before end_date.",
        ));
    }
    if body.min_age > body.max_age {
        return Err(AppError::invalid("min_age must not exceed max_age."));
    }
    if body.required_members < 1 {
        return Err(AppError::invalid("required_members must be at least 1."));
    }

    let city_id = body.destination_id.to_string();
    let city_exists = sqlx::query("SELECT 1 FROM cities WHERE id=?")
        .bind(&city_id)
        .fetch_optional(&db_pool)
        .await?
        .is_some();
    if !city_exists {
        return Err(AppError::invalid("destination_id: Invalid destination."));
    }

    let trip_id = Uuid::now_v7().to_string();
    let mut tx = db_pool.begin().await?;
    sqlx::query(
        "INSERT INTO trips (id,host_id,group_name,city_id,start_date,end_date,description,\
         min_age,max_age,required_members,created_at) VALUES (?,?,?,?,?,?,?,?,?,?,?)",
    )
    .bind(&trip_id)
    .bind(&auth.id)
    .bind(body.group_name.trim())
    .bind(&city_id)
    .bind(&body.start_date)
    .bind(&body.end_date)
    .bind(&body.description)
    .bind(body.min_age)
    .bind(body.max_age)
    .bind(body.required_members)
    .bind(db::now())
    .execute(&mut *tx)
    .await?;

    for item in &body.itinerary {
        sqlx::query("INSERT INTO trip_itinerary (trip_id,day,description) VALUES (?,?,?)")
            .bind(&trip_id)
            .bind(item.day)
            .bind(&item.description)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    info!("u/{} opened trip {trip_id}", auth.username);

    let trip = super::fetch(&db_pool, &trip_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok((StatusCode::CREATED, Json(super::api_trip(&db_pool, &trip).await?)))
}
