use serde::Serialize;
use sqlx::SqlitePool;

use crate::AppResult;

use super::{Trip, join};

/// A user's relationship to a trip. Exactly one of these holds at any
/// moment, and `Host` shadows everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    Host,
    Member,
    Pending,
    Rejected,
    None,
}

/// Read-only evaluation against committed state; no caching, callable any
/// number of times.
pub async fn evaluate(db_pool: &SqlitePool, trip: &Trip, user_id: &str) -> AppResult<Membership> {
    if trip.host_id == user_id {
        return Ok(Membership::Host);
    }

    let is_member = sqlx::query("SELECT 1 FROM trip_members WHERE trip_id=? AND user_id=?")
        .bind(&trip.id)
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?
        .is_some();
    if is_member {
        return Ok(Membership::Member);
    }

    let status: Option<(String,)> =
        sqlx::query_as("SELECT status FROM join_requests WHERE trip_id=? AND user_id=?")
            .bind(&trip.id)
            .bind(user_id)
            .fetch_optional(db_pool)
            .await?;

    Ok(match status.as_ref().map(|(s,)| s.as_str()) {
        Some(join::PENDING) => Membership::Pending,
        Some(join::REJECTED) => Membership::Rejected,
        // approve writes the member edge and the status in one transaction,
        // so an accepted row without the edge cannot be observed
        Some(join::ACCEPTED) => Membership::Member,
        _ => Membership::None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[tokio::test]
    async fn host_wins_over_everything() {
        let db_pool = testutil::pool().await;
        let host = testutil::user(&db_pool, "hana").await;
        let trip = testutil::trip(&db_pool, &host).await;

        assert_eq!(
            evaluate(&db_pool, &trip, &host).await.unwrap(),
            Membership::Host
        );
    }

    #[tokio::test]
    async fn stranger_is_none() {
        let db_pool = testutil::pool().await;
        let host = testutil::user(&db_pool, "hana").await;
        let other = testutil::user(&db_pool, "omar").await;
        let trip = testutil::trip(&db_pool, &host).await;

        assert_eq!(
            evaluate(&db_pool, &trip, &other).await.unwrap(),
            Membership::None
        );
    }

    #[tokio::test]
    async fn request_status_is_reflected() {
        let db_pool = testutil::pool().await;
        let host = testutil::user(&db_pool, "hana").await;
        let other = testutil::user(&db_pool, "omar").await;
        let trip = testutil::trip(&db_pool, &host).await;

        join::request_join(&db_pool, &trip, &other).await.unwrap();
        assert_eq!(
            evaluate(&db_pool, &trip, &other).await.unwrap(),
            Membership::Pending
        );

        let request = testutil::request_for(&db_pool, &trip.id, &other).await;
        join::reject(&db_pool, &request).await.unwrap();
        assert_eq!(
            evaluate(&db_pool, &trip, &other).await.unwrap(),
            Membership::Rejected
        );

        join::approve(&db_pool, &request).await.unwrap();
        assert_eq!(
            evaluate(&db_pool, &trip, &other).await.unwrap(),
            Membership::Member
        );
    }

    #[tokio::test]
    async fn host_never_reported_as_member() {
        let db_pool = testutil::pool().await;
        let host = testutil::user(&db_pool, "hana").await;
        let trip = testutil::trip(&db_pool, &host).await;

        // even if an edge sneaks in, the host check comes first
        sqlx::query("INSERT OR IGNORE INTO trip_members (trip_id,user_id) VALUES (?,?)")
            .bind(&trip.id)
            .bind(&host)
            .execute(&db_pool)
            .await
            .unwrap();

        assert_eq!(
            evaluate(&db_pool, &trip, &host).await.unwrap(),
            Membership::Host
        );
    }
}
