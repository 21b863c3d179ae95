use envkeep_core::UserIdentity;
use serde::Serialize;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// API representation of the authenticated user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub subject: String,
    pub email: Option<String>,
    pub is_admin: bool,
}

impl From<&UserIdentity> for UserIdentityResponse {
    fn from(value: &UserIdentity) -> Self {
        Self {
            subject: value.subject().to_owned(),
            email: value.email().map(ToOwned::to_owned),
            is_admin: value.is_admin(),
        }
    }
}
