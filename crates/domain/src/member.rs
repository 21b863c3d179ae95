//! Project membership and invitation types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use envkeep_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{EnvironmentId, MemberId, ProjectId};

/// Validated, lowercased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: exactly one `@`, non-empty local
    /// part, and a domain containing at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let trimmed = value.into().trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        };

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.contains('@') || domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Lifecycle state of a project member row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    /// Invited email has not registered yet.
    Invited,
    /// Member row is linked to a registered user.
    Active,
}

impl MemberStatus {
    /// Returns the storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invited => "INVITED",
            Self::Active => "ACTIVE",
        }
    }

    /// Parses a storage value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "INVITED" => Ok(Self::Invited),
            "ACTIVE" => Ok(Self::Active),
            _ => Err(AppError::Validation(format!(
                "unknown member status '{value}'"
            ))),
        }
    }
}

/// Per-project access grant for a non-admin user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMember {
    /// Stable member row id.
    pub id: MemberId,
    /// Project the grant applies to.
    pub project_id: ProjectId,
    /// Registered user id; `None` while the invite is pending.
    pub user_id: Option<String>,
    /// Email the invitation was sent to.
    pub invite_email: EmailAddress,
    /// Environments the member may see.
    pub environments: BTreeSet<EnvironmentId>,
    /// Invitation state.
    pub status: MemberStatus,
    /// Invitation timestamp.
    pub invited_at: DateTime<Utc>,
}

impl ProjectMember {
    /// Creates a member row, active when the email already belongs to a registered user.
    #[must_use]
    pub fn invite(
        project_id: ProjectId,
        invite_email: EmailAddress,
        user_id: Option<String>,
        environments: BTreeSet<EnvironmentId>,
        now: DateTime<Utc>,
    ) -> Self {
        let status = if user_id.is_some() {
            MemberStatus::Active
        } else {
            MemberStatus::Invited
        };

        Self {
            id: MemberId::new(),
            project_id,
            user_id,
            invite_email,
            environments,
            status,
            invited_at: now,
        }
    }

    /// Returns whether the grant exposes the project at all.
    #[must_use]
    pub fn grants_project_access(&self) -> bool {
        !self.environments.is_empty()
    }

    /// Returns whether the member may see the environment.
    #[must_use]
    pub fn can_access(&self, environment_id: EnvironmentId) -> bool {
        self.environments.contains(&environment_id)
    }

    /// Human-readable label used in audit descriptions.
    #[must_use]
    pub fn label(&self) -> &str {
        self.user_id
            .as_deref()
            .unwrap_or(self.invite_email.as_str())
    }
}
