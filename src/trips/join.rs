use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{AppError, AppResult, db};

use super::{Trip, membership, membership::Membership};

pub(crate) const PENDING: &str = "pending";
pub(crate) const ACCEPTED: &str = "accepted";
pub(crate) const REJECTED: &str = "rejected";

/// One row per (trip, user), ever. `pending` and `rejected` rows are live
/// state; an `accepted` row is history, the members set takes over.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JoinRequest {
    pub id: String,
    pub trip_id: String,
    pub user_id: String,
    pub status: String,
    pub created_at: i64,
}

pub async fn fetch(db_pool: &SqlitePool, id: &str) -> AppResult<Option<JoinRequest>> {
    Ok(
        sqlx::query_as("SELECT id,trip_id,user_id,status,created_at FROM join_requests WHERE id=?")
            .bind(id)
            .fetch_optional(db_pool)
            .await?,
    )
}

/// `none → pending` and `rejected → pending`. Hosts and members are turned
/// away, as is anyone with a request already in flight.
pub async fn request_join(db_pool: &SqlitePool, trip: &Trip, user_id: &str) -> AppResult<()> {
    match membership::evaluate(db_pool, trip, user_id).await? {
        Membership::Host | Membership::Member => Err(AppError::AlreadyMember),
        Membership::Pending => Err(AppError::DuplicatePending),
        Membership::Rejected | Membership::None => {
            upsert_pending(db_pool, &trip.id, user_id).await
        }
    }
}

// The conflict arm is what a racing second caller (or a re-request after
// rejection) hits: the existing row flips back to pending and keeps its id
// and created_at.
pub(crate) async fn upsert_pending(
    db_pool: &SqlitePool,
    trip_id: &str,
    user_id: &str,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO join_requests (id,trip_id,user_id,status,created_at) VALUES (?,?,?,?,?) \
         ON CONFLICT(trip_id,user_id) DO UPDATE SET status=excluded.status",
    )
    .bind(Uuid::now_v7().to_string())
    .bind(trip_id)
    .bind(user_id)
    .bind(PENDING)
    .bind(db::now())
    .execute(db_pool)
    .await?;
    Ok(())
}

/// Member edge + status flip in one transaction; a duplicate edge insert is
/// a no-op, so approving twice converges on the same state.
pub async fn approve(db_pool: &SqlitePool, request: &JoinRequest) -> AppResult<()> {
    let mut tx = db_pool.begin().await?;
    sqlx::query("INSERT OR IGNORE INTO trip_members (trip_id,user_id) VALUES (?,?)")
        .bind(&request.trip_id)
        .bind(&request.user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE join_requests SET status=? WHERE id=?")
        .bind(ACCEPTED)
        .bind(&request.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

/// No membership change; overwrites whatever status the row had (legacy
/// idempotent-overwrite semantics).
pub async fn reject(db_pool: &SqlitePool, request: &JoinRequest) -> AppResult<()> {
    sqlx::query("UPDATE join_requests SET status=? WHERE id=?")
        .bind(REJECTED)
        .bind(&request.id)
        .execute(db_pool)
        .await?;
    Ok(())
}

#[derive(Serialize)]
pub struct InboxTrip {
    pub id: String,
    pub group_name: String,
}

#[derive(Serialize)]
pub struct InboxUser {
    pub id: String,
    pub username: String,
    pub name: String,
}

#[derive(Serialize)]
pub struct InboxEntry {
    pub id: String,
    pub trip: InboxTrip,
    pub user: InboxUser,
    pub status: String,
    pub created_at: i64,
}

/// Pending requests across all trips the host owns, denormalized in a
/// single query, oldest first.
pub async fn pending_for_host(db_pool: &SqlitePool, host_id: &str) -> AppResult<Vec<InboxEntry>> {
    let rows: Vec<(String, String, String, String, String, String, i64)> = sqlx::query_as(
        "SELECT r.id, t.id, t.group_name, u.id, u.username, p.name, r.created_at \
         FROM join_requests r \
         JOIN trips t ON t.id = r.trip_id \
         JOIN users u ON u.id = r.user_id \
         JOIN profiles p ON p.user_id = u.id \
         WHERE t.host_id = ? AND r.status = ? \
         ORDER BY r.created_at ASC, r.id ASC",
    )
    .bind(host_id)
    .bind(PENDING)
    .fetch_all(db_pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(id, trip_id, group_name, user_id, username, name, created_at)| InboxEntry {
                id,
                trip: InboxTrip {
                    id: trip_id,
                    group_name,
                },
                user: InboxUser {
                    id: user_id,
                    username,
                    name,
                },
                status: PENDING.to_owned(),
                created_at,
            },
        )
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    async fn row_count(db_pool: &SqlitePool, trip_id: &str, user_id: &str) -> i64 {
        let (n,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM join_requests WHERE trip_id=? AND user_id=?")
                .bind(trip_id)
                .bind(user_id)
                .fetch_one(db_pool)
                .await
                .unwrap();
        n
    }

    #[tokio::test]
    async fn first_request_creates_pending_row() {
        let db_pool = testutil::pool().await;
        let host = testutil::user(&db_pool, "hana").await;
        let user = testutil::user(&db_pool, "omar").await;
        let trip = testutil::trip(&db_pool, &host).await;

        request_join(&db_pool, &trip, &user).await.unwrap();

        let request = testutil::request_for(&db_pool, &trip.id, &user).await;
        assert_eq!(request.status, PENDING);
        assert_eq!(row_count(&db_pool, &trip.id, &user).await, 1);
    }

    #[tokio::test]
    async fn host_and_member_cannot_request() {
        let db_pool = testutil::pool().await;
        let host = testutil::user(&db_pool, "hana").await;
        let user = testutil::user(&db_pool, "omar").await;
        let trip = testutil::trip(&db_pool, &host).await;

        assert!(matches!(
            request_join(&db_pool, &trip, &host).await,
            Err(AppError::AlreadyMember)
        ));

        request_join(&db_pool, &trip, &user).await.unwrap();
        let request = testutil::request_for(&db_pool, &trip.id, &user).await;
        approve(&db_pool, &request).await.unwrap();

        assert!(matches!(
            request_join(&db_pool, &trip, &user).await,
            Err(AppError::AlreadyMember)
        ));
    }

    #[tokio::test]
    async fn pending_request_cannot_be_duplicated() {
        let db_pool = testutil::pool().await;
        let host = testutil::user(&db_pool, "hana").await;
        let user = testutil::user(&db_pool, "omar").await;
        let trip = testutil::trip(&db_pool, &host).await;

        request_join(&db_pool, &trip, &user).await.unwrap();
        assert!(matches!(
            request_join(&db_pool, &trip, &user).await,
            Err(AppError::DuplicatePending)
        ));
        assert_eq!(row_count(&db_pool, &trip.id, &user).await, 1);
    }

    #[tokio::test]
    async fn rejected_then_rerequest_reuses_the_row() {
        let db_pool = testutil::pool().await;
        let host = testutil::user(&db_pool, "hana").await;
        let user = testutil::user(&db_pool, "omar").await;
        let trip = testutil::trip(&db_pool, &host).await;

        request_join(&db_pool, &trip, &user).await.unwrap();
        let first = testutil::request_for(&db_pool, &trip.id, &user).await;
        reject(&db_pool, &first).await.unwrap();

        request_join(&db_pool, &trip, &user).await.unwrap();
        let second = testutil::request_for(&db_pool, &trip.id, &user).await;

        assert_eq!(row_count(&db_pool, &trip.id, &user).await, 1);
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.status, PENDING);
    }

    #[tokio::test]
    async fn racing_upserts_collapse_to_one_row() {
        let db_pool = testutil::pool().await;
        let host = testutil::user(&db_pool, "hana").await;
        let user = testutil::user(&db_pool, "omar").await;
        let trip = testutil::trip(&db_pool, &host).await;

        // two callers that both observed `none` before writing
        upsert_pending(&db_pool, &trip.id, &user).await.unwrap();
        upsert_pending(&db_pool, &trip.id, &user).await.unwrap();

        assert_eq!(row_count(&db_pool, &trip.id, &user).await, 1);
    }

    #[tokio::test]
    async fn approve_is_idempotent() {
        let db_pool = testutil::pool().await;
        let host = testutil::user(&db_pool, "hana").await;
        let user = testutil::user(&db_pool, "omar").await;
        let trip = testutil::trip(&db_pool, &host).await;

        request_join(&db_pool, &trip, &user).await.unwrap();
        let request = testutil::request_for(&db_pool, &trip.id, &user).await;

        approve(&db_pool, &request).await.unwrap();
        approve(&db_pool, &request).await.unwrap();

        let (edges,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM trip_members WHERE trip_id=? AND user_id=?")
                .bind(&trip.id)
                .bind(&user)
                .fetch_one(&db_pool)
                .await
                .unwrap();
        assert_eq!(edges, 1);
        assert_eq!(
            testutil::request_for(&db_pool, &trip.id, &user).await.status,
            ACCEPTED
        );
    }

    #[tokio::test]
    async fn inbox_is_scoped_to_host_and_ordered() {
        let db_pool = testutil::pool().await;
        let hana = testutil::user(&db_pool, "hana").await;
        let noor = testutil::user(&db_pool, "noor").await;
        let omar = testutil::user(&db_pool, "omar").await;
        let rui = testutil::user(&db_pool, "rui").await;

        let hanas_trip = testutil::trip(&db_pool, &hana).await;
        let noors_trip = testutil::trip(&db_pool, &noor).await;

        request_join(&db_pool, &hanas_trip, &omar).await.unwrap();
        request_join(&db_pool, &hanas_trip, &rui).await.unwrap();
        request_join(&db_pool, &noors_trip, &omar).await.unwrap();

        // a rejected request leaves the inbox
        let ruis = testutil::request_for(&db_pool, &hanas_trip.id, &rui).await;
        reject(&db_pool, &ruis).await.unwrap();

        let inbox = pending_for_host(&db_pool, &hana).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].user.username, "omar");
        assert_eq!(inbox[0].trip.id, hanas_trip.id);

        let inbox = pending_for_host(&db_pool, &noor).await.unwrap();
        assert_eq!(inbox.len(), 1);
    }
}
