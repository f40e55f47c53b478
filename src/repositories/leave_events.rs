use sqlx::SqlitePool;
use time::PrimitiveDateTime;

use crate::db::models::LeaveRow;

pub(crate) async fn find(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<LeaveRow>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRow>(
        "SELECT username, leave_count, last_leave_at FROM leave_events WHERE username = ?1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn insert_first(
    pool: &SqlitePool,
    username: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO leave_events (username, leave_count, last_leave_at) VALUES (?1, 1, ?2)",
    )
    .bind(username)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn increment(
    pool: &SqlitePool,
    username: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE leave_events SET leave_count = leave_count + 1, last_leave_at = ?2
         WHERE username = ?1",
    )
    .bind(username)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Advances the episode timestamp without counting another leave.
pub(crate) async fn touch(
    pool: &SqlitePool,
    username: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE leave_events SET last_leave_at = ?2 WHERE username = ?1")
        .bind(username)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) async fn list_counts(pool: &SqlitePool) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, i64)>("SELECT username, leave_count FROM leave_events")
        .fetch_all(pool)
        .await
}

pub(crate) async fn delete_all(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM leave_events").execute(pool).await?;
    Ok(())
}
