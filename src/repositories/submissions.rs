use sqlx::SqlitePool;
use time::PrimitiveDateTime;

use crate::db::models::SubmissionRow;

const COLUMNS: &str = "username, question, submitted, started_at";

pub(crate) async fn find(
    pool: &SqlitePool,
    username: &str,
    question: &str,
) -> Result<Option<SubmissionRow>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionRow>(&format!(
        "SELECT {COLUMNS} FROM submissions WHERE username = ?1 AND question = ?2"
    ))
    .bind(username)
    .bind(question)
    .fetch_optional(pool)
    .await
}

/// Starts the timer for a pair by inserting its ledger row. A row that
/// already exists is left untouched, whatever its state. Returns whether a
/// new row was created.
pub(crate) async fn start_if_absent(
    pool: &SqlitePool,
    username: &str,
    question: &str,
    started_at: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO submissions (username, question, submitted, started_at)
         VALUES (?1, ?2, 0, ?3)
         ON CONFLICT (username, question) DO NOTHING",
    )
    .bind(username)
    .bind(question)
    .bind(started_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Flips a pair to submitted. An existing row keeps its original
/// `started_at`; a pair submitted without a prior start gets `fallback`.
pub(crate) async fn mark_submitted(
    pool: &SqlitePool,
    username: &str,
    question: &str,
    fallback: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO submissions (username, question, submitted, started_at)
         VALUES (?1, ?2, 1, ?3)
         ON CONFLICT (username, question) DO UPDATE SET submitted = 1",
    )
    .bind(username)
    .bind(question)
    .bind(fallback)
    .execute(pool)
    .await?;

    Ok(())
}

pub(crate) async fn list_for_user(
    pool: &SqlitePool,
    username: &str,
) -> Result<Vec<SubmissionRow>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionRow>(&format!(
        "SELECT {COLUMNS} FROM submissions WHERE username = ?1"
    ))
    .bind(username)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_all(pool: &SqlitePool) -> Result<Vec<SubmissionRow>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionRow>(&format!("SELECT {COLUMNS} FROM submissions"))
        .fetch_all(pool)
        .await
}

pub(crate) async fn count_rows(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM submissions").fetch_one(pool).await
}

pub(crate) async fn count_started_students(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT username) FROM submissions WHERE started_at IS NOT NULL",
    )
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_all(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM submissions").execute(pool).await?;
    Ok(())
}
