use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::api::validation::validate_answer_upload;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::repositories;
use crate::schemas::question::{
    AutoSubmitResponse, QuestionDetailResponse, QuestionListResponse, QuestionSummary,
    ReviewEntry, ReviewResponse, SubmitResponse,
};
use crate::services::questions::QuestionSpec;
use crate::services::submissions::{self, SubmissionError};
use crate::services::timing;

// Multipart framing overhead on top of the configured upload cap.
const BODY_LIMIT_SLACK_BYTES: usize = 64 * 1024;

pub(crate) fn router(state: &AppState) -> Router<AppState> {
    let max_body = state.settings().storage().max_upload_size_mb as usize * 1024 * 1024
        + BODY_LIMIT_SLACK_BYTES;

    Router::new()
        .route("/", get(list_questions))
        .route("/:question_id", get(question_detail))
        .route("/:question_id/submit", post(submit_answer))
        .route("/:question_id/auto-submit", post(auto_submit))
        .layer(DefaultBodyLimit::max(max_body))
}

fn lookup_question(state: &AppState, question_id: &str) -> Result<&'static QuestionSpec, ApiError> {
    state
        .questions()
        .get(question_id)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown question '{question_id}'")))
}

async fn list_questions(
    CurrentStudent(principal): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<QuestionListResponse>, ApiError> {
    let rows = repositories::submissions::list_for_user(state.db(), &principal.username)
        .await
        .map_err(|e| ApiError::internal(&state, e, "Failed to load submission ledger"))?;

    let started = !rows.is_empty();
    let submitted_for =
        |id: &str| rows.iter().any(|row| row.question == id && row.submitted);

    let questions: Vec<QuestionSummary> = state
        .questions()
        .all()
        .iter()
        .map(|spec| QuestionSummary {
            id: spec.id.to_string(),
            duration_seconds: spec.duration_seconds,
            submitted: submitted_for(spec.id),
        })
        .collect();

    let current_question =
        questions.iter().find(|q| !q.submitted).map(|q| q.id.clone());

    Ok(Json(QuestionListResponse { started, current_question, questions }))
}

/// Shows one question and starts its countdown on first view. Expired or
/// already-submitted questions are refused; the client falls back to the
/// review page.
async fn question_detail(
    Path(question_id): Path<String>,
    CurrentStudent(principal): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<QuestionDetailResponse>, ApiError> {
    let spec = lookup_question(&state, &question_id)?;

    let row = repositories::submissions::find(state.db(), &principal.username, spec.id)
        .await
        .map_err(|e| ApiError::internal(&state, e, "Failed to load submission ledger"))?;

    let now = primitive_now_utc();
    let started_at = row.as_ref().and_then(|r| r.started_at);
    let submitted = row.as_ref().map(|r| r.submitted).unwrap_or(false);
    let time_left = timing::remaining_seconds(spec.duration_seconds, started_at, now);

    if !timing::can_access(time_left, submitted) {
        return Err(ApiError::Forbidden("Question is no longer accessible"));
    }

    if row.is_none() {
        let _guard = state.write_guard().await;
        repositories::submissions::start_if_absent(state.db(), &principal.username, spec.id, now)
            .await
            .map_err(|e| ApiError::internal(&state, e, "Failed to start question timer"))?;
        tracing::info!(username = %principal.username, question = spec.id, "Question timer started");
    }

    let text = state.questions().text(spec.id).await;

    Ok(Json(QuestionDetailResponse { id: spec.id.to_string(), text, time_left }))
}

async fn submit_answer(
    Path(question_id): Path<String>,
    CurrentStudent(principal): CurrentStudent,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SubmitResponse>, ApiError> {
    let spec = lookup_question(&state, &question_id)?;

    let row = repositories::submissions::find(state.db(), &principal.username, spec.id)
        .await
        .map_err(|e| ApiError::internal(&state, e, "Failed to load submission ledger"))?;

    if row.as_ref().map(|r| r.submitted).unwrap_or(false) {
        return Err(ApiError::Conflict("Question already submitted".to_string()));
    }

    let started_at = row.and_then(|r| r.started_at);
    let time_left =
        timing::remaining_seconds(spec.duration_seconds, started_at, primitive_now_utc());
    if time_left == 0 {
        return Err(ApiError::Forbidden("Time is up for this question"));
    }

    let max_bytes = state.settings().storage().max_upload_size_mb * 1024 * 1024;
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        if field.name().unwrap_or("") != "answer" {
            continue;
        }

        filename = field.file_name().map(|s| s.to_string());
        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
        {
            if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(ApiError::BadRequest(format!(
                    "File size exceeds {}MB limit",
                    state.settings().storage().max_upload_size_mb
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        file_bytes = Some(bytes);
    }

    let file_bytes =
        file_bytes.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    let filename = filename.unwrap_or_default();
    validate_answer_upload(&filename, &state.settings().storage().allowed_answer_extensions)?;

    let artifact =
        submissions::submit_answer(&state, &principal.username, spec.id, &file_bytes)
            .await
            .map_err(|err| map_submission_error(&state, err))?;

    tracing::info!(
        username = %principal.username,
        question = spec.id,
        size = artifact.size,
        sha256 = %artifact.sha256_hex,
        "Submission stored"
    );

    Ok(Json(SubmitResponse {
        message: "Submission received".to_string(),
        next_question: state.questions().next_after(spec.id).map(str::to_string),
        size: artifact.size,
        sha256: artifact.sha256_hex,
    }))
}

/// Expiry signal from the client. Writes a placeholder artifact so the
/// ledger never says "submitted" without a file behind it.
async fn auto_submit(
    Path(question_id): Path<String>,
    CurrentStudent(principal): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<AutoSubmitResponse>, ApiError> {
    let spec = lookup_question(&state, &question_id)?;
    let next_question = state.questions().next_after(spec.id).map(str::to_string);

    let row = repositories::submissions::find(state.db(), &principal.username, spec.id)
        .await
        .map_err(|e| ApiError::internal(&state, e, "Failed to load submission ledger"))?;

    if row.as_ref().map(|r| r.submitted).unwrap_or(false) {
        return Ok(Json(AutoSubmitResponse {
            message: "Question already submitted".to_string(),
            next_question,
        }));
    }

    let started_at = row.as_ref().and_then(|r| r.started_at);
    let time_left =
        timing::remaining_seconds(spec.duration_seconds, started_at, primitive_now_utc());
    if row.is_none() || time_left > 0 {
        return Err(ApiError::BadRequest("Question timer has not expired".to_string()));
    }

    submissions::auto_submit(&state, &principal.username, spec.id)
        .await
        .map_err(|err| map_submission_error(&state, err))?;

    tracing::info!(username = %principal.username, question = spec.id, "Auto-submission recorded");

    Ok(Json(AutoSubmitResponse {
        message: "Auto-submission recorded".to_string(),
        next_question,
    }))
}

pub(crate) async fn review(
    CurrentStudent(principal): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let rows = repositories::submissions::list_for_user(state.db(), &principal.username)
        .await
        .map_err(|e| ApiError::internal(&state, e, "Failed to load submission ledger"))?;

    let mut entries = std::collections::BTreeMap::new();
    for spec in state.questions().all() {
        let row = rows.iter().find(|r| r.question == spec.id);
        let submitted = row.map(|r| r.submitted).unwrap_or(false)
            || state.store().exists(&principal.username, spec.id).await;
        entries.insert(
            spec.id.to_string(),
            ReviewEntry {
                submitted,
                started_at: row.and_then(|r| r.started_at).map(format_primitive),
            },
        );
    }

    Ok(Json(ReviewResponse { submissions: entries }))
}

fn map_submission_error(state: &AppState, err: SubmissionError) -> ApiError {
    match err {
        SubmissionError::Storage(e) => {
            ApiError::storage(state, e, "Failed to store submission")
        }
        SubmissionError::Ledger(e) => {
            ApiError::internal(state, e, "Failed to record submission")
        }
    }
}
