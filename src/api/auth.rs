use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentPrincipal;
use crate::core::security;
use crate::core::state::AppState;
use crate::schemas::auth::{LoginRequest, PrincipalResponse, TokenResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/login", post(login)).route("/me", get(me))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let principal = state
        .roster()
        .verify(&payload.username, &payload.password)
        .ok_or(ApiError::Unauthorized("Incorrect username or password"))?;

    let token =
        security::create_access_token(&principal.username, principal.role, state.settings(), None)
            .map_err(|e| ApiError::internal(&state, e, "Failed to create access token"))?;

    tracing::info!(username = %principal.username, role = ?principal.role, "Login succeeded");

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: PrincipalResponse::from_principal(&principal),
    }))
}

async fn me(CurrentPrincipal(principal): CurrentPrincipal) -> Json<PrincipalResponse> {
    Json(PrincipalResponse::from_principal(&principal))
}
