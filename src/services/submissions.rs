use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::services::presence::{classify_leave, LeaveAction};
use crate::services::storage::{StoredArtifact, AUTO_SUBMIT_PLACEHOLDER};

#[derive(Debug, Error)]
pub(crate) enum SubmissionError {
    #[error("failed to store answer artifact: {0}")]
    Storage(#[from] std::io::Error),
    #[error("failed to update submission ledger: {0}")]
    Ledger(#[from] sqlx::Error),
}

/// Stores the uploaded answer, then flips the ledger row to submitted. The
/// artifact lands on disk before the ledger is touched; a storage failure
/// leaves the ledger exactly as it was.
pub(crate) async fn submit_answer(
    state: &AppState,
    username: &str,
    question: &str,
    bytes: &[u8],
) -> Result<StoredArtifact, SubmissionError> {
    let _guard = state.write_guard().await;

    let artifact = state.store().store(username, question, bytes).await?;
    repositories::submissions::mark_submitted(
        state.db(),
        username,
        question,
        primitive_now_utc(),
    )
    .await?;

    Ok(artifact)
}

/// Expiry path: a placeholder artifact stands in for the upload so that a
/// submitted ledger row always has a file behind it. An artifact that is
/// already on disk is kept.
pub(crate) async fn auto_submit(
    state: &AppState,
    username: &str,
    question: &str,
) -> Result<(), SubmissionError> {
    let _guard = state.write_guard().await;

    if !state.store().exists(username, question).await {
        state.store().store(username, question, AUTO_SUBMIT_PLACEHOLDER).await?;
    }
    repositories::submissions::mark_submitted(
        state.db(),
        username,
        question,
        primitive_now_utc(),
    )
    .await?;

    Ok(())
}

/// Roster-seeded submission matrix: every student appears with every
/// question, defaulting to false, overlaid with ledger rows, then with
/// filesystem existence. A file on disk wins over a false ledger flag; that
/// recovers from a ledger write lost after the artifact was stored, and the
/// divergence is logged rather than silently absorbed.
pub(crate) async fn all_submissions(
    state: &AppState,
) -> Result<BTreeMap<String, BTreeMap<String, bool>>, sqlx::Error> {
    let mut matrix: BTreeMap<String, BTreeMap<String, bool>> = BTreeMap::new();

    for student in state.roster().student_names() {
        matrix.insert(student.to_string(), empty_question_map(state));
    }

    for row in repositories::submissions::list_all(state.db()).await? {
        let per_user =
            matrix.entry(row.username.clone()).or_insert_with(|| empty_question_map(state));
        if let Some(flag) = per_user.get_mut(&row.question) {
            *flag = row.submitted;
        }
    }

    for (username, per_user) in matrix.iter_mut() {
        for (question, flag) in per_user.iter_mut() {
            if !*flag && state.store().exists(username, question).await {
                tracing::warn!(
                    username = %username,
                    question = %question,
                    "Artifact on disk without submitted ledger row; reporting as submitted"
                );
                *flag = true;
            }
        }
    }

    Ok(matrix)
}

fn empty_question_map(state: &AppState) -> BTreeMap<String, bool> {
    state.questions().all().iter().map(|q| (q.id.to_string(), false)).collect()
}

pub(crate) async fn leave_counts(
    state: &AppState,
) -> Result<BTreeMap<String, i64>, sqlx::Error> {
    let mut counts: BTreeMap<String, i64> =
        state.roster().student_names().map(|name| (name.to_string(), 0)).collect();

    for (username, count) in repositories::leave_events::list_counts(state.db()).await? {
        counts.insert(username, count);
    }

    Ok(counts)
}

pub(crate) async fn record_leave(state: &AppState, username: &str) -> Result<(), sqlx::Error> {
    let _guard = state.write_guard().await;

    let now = primitive_now_utc();
    let existing = repositories::leave_events::find(state.db(), username).await?;

    match classify_leave(existing.map(|row| row.last_leave_at), now) {
        LeaveAction::First => {
            repositories::leave_events::insert_first(state.db(), username, now).await
        }
        LeaveAction::Increment => {
            repositories::leave_events::increment(state.db(), username, now).await
        }
        LeaveAction::Touch => repositories::leave_events::touch(state.db(), username, now).await,
    }
}

/// Destructive wipe: storage tree first, then both ledger tables, then the
/// error ring. Roster and question definitions are untouched.
pub(crate) async fn reset(state: &AppState) -> Result<(), SubmissionError> {
    let _guard = state.write_guard().await;

    state.store().reset().await?;
    repositories::submissions::delete_all(state.db()).await?;
    repositories::leave_events::delete_all(state.db()).await?;
    state.events().clear_errors();

    Ok(())
}
