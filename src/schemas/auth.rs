use serde::{Deserialize, Serialize};

use crate::services::roster::{Principal, Role};

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) username: String,
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PrincipalResponse {
    pub(crate) username: String,
    pub(crate) role: Role,
}

impl PrincipalResponse {
    pub(crate) fn from_principal(principal: &Principal) -> Self {
        Self { username: principal.username.clone(), role: principal.role }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
    pub(crate) user: PrincipalResponse,
}
