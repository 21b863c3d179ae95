use serde::{Deserialize, Serialize};

/// Identity resolved once at the request boundary from the external auth service.
///
/// The admin capability is a single normalized flag; access checks never look
/// at raw provider fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
    email: Option<String>,
    is_admin: bool,
}

impl UserIdentity {
    /// Creates a user identity from authentication data.
    #[must_use]
    pub fn new(subject: impl Into<String>, email: Option<String>, is_admin: bool) -> Self {
        Self {
            subject: subject.into(),
            email: email.map(|value| value.trim().to_lowercase()),
            is_admin,
        }
    }

    /// Returns the stable user id from the identity provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the normalized email, if the provider returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns whether the identity bypasses membership filters.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Label recorded as `last_changed_by` and `performed_by`.
    #[must_use]
    pub fn actor_label(&self) -> &str {
        self.email().unwrap_or(self.subject())
    }
}
