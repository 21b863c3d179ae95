use envkeep_domain::ProjectMember;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for adding a project member.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/add-member-request.ts"
)]
pub struct AddMemberRequest {
    pub email: String,
    #[serde(default)]
    pub environment_ids: Vec<String>,
}

/// Incoming payload for replacing a member's environment grants.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-member-request.ts"
)]
pub struct UpdateMemberRequest {
    pub environment_ids: Vec<String>,
}

/// API representation of a project member.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/member-response.ts"
)]
pub struct MemberResponse {
    pub id: String,
    pub project_id: String,
    pub user_id: Option<String>,
    pub email: String,
    pub environment_ids: Vec<String>,
    pub status: String,
    pub invited_at: String,
}

impl From<ProjectMember> for MemberResponse {
    fn from(value: ProjectMember) -> Self {
        Self {
            id: value.id.to_string(),
            project_id: value.project_id.to_string(),
            user_id: value.user_id,
            email: value.invite_email.as_str().to_owned(),
            environment_ids: value
                .environments
                .iter()
                .map(ToString::to_string)
                .collect(),
            status: value.status.as_str().to_owned(),
            invited_at: value.invited_at.to_rfc3339(),
        }
    }
}
