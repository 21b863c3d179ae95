use std::str::FromStr;

use chrono::{DateTime, Utc};
use envkeep_core::AppError;
use serde::{Deserialize, Serialize};

use crate::{AuditEntryId, EnvironmentId, ProjectId, SecretId};

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// A secret value was written in one environment.
    SecretUpdate,
    /// One environment's copy of a secret was deleted.
    SecretDelete,
    /// A secret was marked synced without a value change.
    SecretSync,
    /// A member row was added.
    MemberAdd,
    /// A member's environment grants changed.
    MemberUpdate,
    /// A member row was removed.
    MemberRemove,
    /// A project was created.
    ProjectCreate,
    /// An environment was created.
    EnvironmentCreate,
    /// An environment and its secrets were deleted.
    EnvironmentDelete,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SecretUpdate => "SECRET_UPDATE",
            Self::SecretDelete => "SECRET_DELETE",
            Self::SecretSync => "SECRET_SYNC",
            Self::MemberAdd => "MEMBER_ADD",
            Self::MemberUpdate => "MEMBER_UPDATE",
            Self::MemberRemove => "MEMBER_REMOVE",
            Self::ProjectCreate => "PROJECT_CREATE",
            Self::EnvironmentCreate => "ENVIRONMENT_CREATE",
            Self::EnvironmentDelete => "ENVIRONMENT_DELETE",
        }
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "SECRET_UPDATE" => Ok(Self::SecretUpdate),
            "SECRET_DELETE" => Ok(Self::SecretDelete),
            "SECRET_SYNC" => Ok(Self::SecretSync),
            "MEMBER_ADD" => Ok(Self::MemberAdd),
            "MEMBER_UPDATE" => Ok(Self::MemberUpdate),
            "MEMBER_REMOVE" => Ok(Self::MemberRemove),
            "PROJECT_CREATE" => Ok(Self::ProjectCreate),
            "ENVIRONMENT_CREATE" => Ok(Self::EnvironmentCreate),
            "ENVIRONMENT_DELETE" => Ok(Self::EnvironmentDelete),
            _ => Err(AppError::Validation(format!(
                "unknown audit action '{value}'"
            ))),
        }
    }
}

/// Append-only audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Stable entry id.
    pub id: AuditEntryId,
    /// Project scope.
    pub project_id: ProjectId,
    /// Environment scope; `None` for project-level actions.
    pub environment_id: Option<EnvironmentId>,
    /// Secret the action touched, when there is one.
    pub secret_id: Option<SecretId>,
    /// Action performed.
    pub action: AuditAction,
    /// Human-readable description.
    pub description: String,
    /// When the action happened.
    pub timestamp: DateTime<Utc>,
    /// Label of the acting identity.
    pub performed_by: String,
}
