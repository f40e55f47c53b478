use axum::{extract::State, http::StatusCode, routing::post, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::core::state::AppState;
use crate::services::submissions;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/leave", post(report_leave))
}

/// Students report leaving or blurring the exam page; rapid repeats inside
/// the debounce window collapse into one counted leave.
async fn report_leave(
    CurrentStudent(principal): CurrentStudent,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    submissions::record_leave(&state, &principal.username)
        .await
        .map_err(|e| ApiError::internal(&state, e, "Failed to record leave event"))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use time::Duration;
    use tower::ServiceExt;

    use crate::core::time::primitive_now_utc;
    use crate::repositories;
    use crate::test_support;

    async fn report(ctx: &test_support::TestContext, token: &str) -> StatusCode {
        ctx.app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/presence/leave",
                Some(token),
                None,
            ))
            .await
            .expect("leave report")
            .status()
    }

    #[tokio::test]
    async fn first_leave_counts_once() {
        let ctx = test_support::setup_test_context().await;
        let token = test_support::student_token(&ctx, "alice");

        assert_eq!(report(&ctx, &token).await, StatusCode::NO_CONTENT);

        let row = repositories::leave_events::find(ctx.state.db(), "alice")
            .await
            .expect("leave read")
            .expect("row");
        assert_eq!(row.leave_count, 1);
    }

    #[tokio::test]
    async fn rapid_leaves_collapse_into_one_episode() {
        let ctx = test_support::setup_test_context().await;
        let token = test_support::student_token(&ctx, "alice");

        assert_eq!(report(&ctx, &token).await, StatusCode::NO_CONTENT);
        assert_eq!(report(&ctx, &token).await, StatusCode::NO_CONTENT);

        let row = repositories::leave_events::find(ctx.state.db(), "alice")
            .await
            .expect("leave read")
            .expect("row");
        assert_eq!(row.leave_count, 1);
    }

    #[tokio::test]
    async fn leaves_past_the_window_count_separately() {
        let ctx = test_support::setup_test_context().await;
        let token = test_support::student_token(&ctx, "alice");

        // First episode happened four seconds ago.
        let backdated = primitive_now_utc() - Duration::seconds(4);
        repositories::leave_events::insert_first(ctx.state.db(), "alice", backdated)
            .await
            .expect("seed leave");

        assert_eq!(report(&ctx, &token).await, StatusCode::NO_CONTENT);

        let row = repositories::leave_events::find(ctx.state.db(), "alice")
            .await
            .expect("leave read")
            .expect("row");
        assert_eq!(row.leave_count, 2);
    }

    #[tokio::test]
    async fn admins_cannot_report_leaves() {
        let ctx = test_support::setup_test_context().await;
        let token = test_support::admin_token(&ctx);

        assert_eq!(report(&ctx, &token).await, StatusCode::FORBIDDEN);
    }
}
