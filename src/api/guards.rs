use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::services::roster::{Principal, Role};

pub(crate) struct CurrentPrincipal(pub(crate) Principal);
pub(crate) struct CurrentStudent(pub(crate) Principal);
pub(crate) struct CurrentAdmin(pub(crate) Principal);

async fn authenticate(parts: &mut Parts, state: &AppState) -> Result<Principal, ApiError> {
    let State(app_state) = State::<AppState>::from_request_parts(parts, state)
        .await
        .map_err(|e| ApiError::internal(state, e, "Failed to access application state"))?;

    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

    let claims = security::verify_token(token, app_state.settings())
        .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

    let principal = app_state
        .roster()
        .lookup(&claims.sub)
        .ok_or(ApiError::Unauthorized("Unknown user"))?;

    // A token minted before a roster change could carry a stale role.
    if principal.role != claims.role {
        return Err(ApiError::Unauthorized("Invalid authentication credentials"));
    }

    Ok(principal)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(CurrentPrincipal(authenticate(parts, state).await?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStudent {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = authenticate(parts, state).await?;

        if principal.role == Role::Student {
            Ok(CurrentStudent(principal))
        } else {
            Err(ApiError::Forbidden("Student access required"))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = authenticate(parts, state).await?;

        if principal.role == Role::Admin {
            Ok(CurrentAdmin(principal))
        } else {
            Err(ApiError::Forbidden("Admin access required"))
        }
    }
}
