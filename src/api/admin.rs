use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::events::{AdminEvent, StatsSnapshot};
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::admin::{OverviewResponse, ResetResponse};
use crate::services::submissions::{self, SubmissionError};

const MAX_EVENTS_WAIT_SECONDS: u64 = 30;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(overview))
        .route("/stats", get(stats))
        .route("/events", get(events))
        .route("/reset", post(reset))
        .route("/submissions/:username/:question", get(download))
}

async fn overview(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<OverviewResponse>, ApiError> {
    let matrix = submissions::all_submissions(&state)
        .await
        .map_err(|e| ApiError::internal(&state, e, "Failed to aggregate submissions"))?;
    let leave_counts = submissions::leave_counts(&state)
        .await
        .map_err(|e| ApiError::internal(&state, e, "Failed to aggregate leave counts"))?;
    let snapshot = build_stats(&state)
        .await
        .map_err(|e| ApiError::internal(&state, e, "Failed to collect stats"))?;

    Ok(Json(OverviewResponse {
        started_students: snapshot.started_students,
        questions: state.questions().all().iter().map(|q| q.id.to_string()).collect(),
        submissions: matrix,
        leave_counts,
        recent_errors: state.events().recent_errors(),
        stats: snapshot,
    }))
}

async fn stats(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<StatsSnapshot>, ApiError> {
    let snapshot = build_stats(&state)
        .await
        .map_err(|e| ApiError::internal(&state, e, "Failed to collect stats"))?;

    state.events().publish_stats(snapshot.clone());

    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    wait_seconds: Option<u64>,
}

/// Long-poll feed of error notices and stats snapshots. Returns at most one
/// event; an empty list means the wait elapsed quietly.
async fn events(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<AdminEvent>> {
    let wait = query
        .wait_seconds
        .unwrap_or(state.settings().exam().events_wait_seconds)
        .min(MAX_EVENTS_WAIT_SECONDS);

    let mut receiver = state.events().subscribe();
    match tokio::time::timeout(Duration::from_secs(wait), receiver.recv()).await {
        Ok(Ok(event)) => Json(vec![event]),
        Ok(Err(_)) => Json(vec![]),
        Err(_) => Json(vec![]),
    }
}

async fn download(
    Path((username, question)): Path<(String, String)>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    if state.roster().lookup(&username).is_none() {
        return Err(ApiError::NotFound(format!("Unknown user '{username}'")));
    }
    let spec = state
        .questions()
        .get(&question)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown question '{question}'")))?;

    let bytes = state
        .store()
        .read(&username, spec.id)
        .await
        .map_err(|e| ApiError::internal(&state, e, "Failed to read submission artifact"))?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    let filename = format!("{username}_{question}.{}", state.store().artifact_extension());

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        bytes,
    ))
}

async fn reset(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<ResetResponse>, ApiError> {
    submissions::reset(&state).await.map_err(|err| match err {
        SubmissionError::Storage(e) => {
            ApiError::internal(&state, e, "Failed to clear submission storage")
        }
        SubmissionError::Ledger(e) => {
            ApiError::internal(&state, e, "Failed to clear submission ledger")
        }
    })?;

    tracing::warn!(admin = %admin.username, "Submission state reset");

    Ok(Json(ResetResponse {
        message: "Database successfully reset. All submissions have been cleared.".to_string(),
    }))
}

async fn build_stats(state: &AppState) -> Result<StatsSnapshot, sqlx::Error> {
    let started_students = repositories::submissions::count_started_students(state.db()).await?;
    let ledger_rows = repositories::submissions::count_rows(state.db()).await?;

    Ok(StatsSnapshot {
        uptime_seconds: state.uptime_seconds(),
        started_students,
        ledger_rows,
        db_pool_size: state.db().size(),
        db_idle_connections: state.db().num_idle(),
    })
}
