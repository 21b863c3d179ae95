use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use envkeep_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{EnvironmentId, ProjectId, SecretId};

/// Secret key restricted to `[A-Z0-9_]+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecretKey(String);

impl SecretKey {
    /// Validates a secret key. Keys are case-sensitive: lowercase input is rejected.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(AppError::Validation(
                "secret key must not be empty".to_owned(),
            ));
        }

        if let Some(invalid) = value.chars().find(|character| !is_key_character(*character)) {
            return Err(AppError::Validation(format!(
                "secret key '{value}' contains '{invalid}'; only A-Z, 0-9 and '_' are allowed"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

fn is_key_character(character: char) -> bool {
    character.is_ascii_uppercase() || character.is_ascii_digit() || character == '_'
}

impl TryFrom<String> for SecretKey {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SecretKey> for String {
    fn from(value: SecretKey) -> Self {
        value.0
    }
}

impl Display for SecretKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// One environment's copy of a secret value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    /// Stable secret id.
    pub id: SecretId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Environment holding this copy.
    pub environment_id: EnvironmentId,
    /// Secret key.
    pub key: SecretKey,
    /// Opaque value; the empty string is a legal value.
    pub value: String,
    /// Starts at 1 and increments on every value write.
    pub version: u32,
    /// Timestamp of the last value write or mark-synced touch.
    pub updated_at: DateTime<Utc>,
    /// Label of the identity that last wrote the value.
    pub last_changed_by: String,
}

impl Secret {
    /// Creates the first version of a secret in an environment.
    #[must_use]
    pub fn first_version(
        project_id: ProjectId,
        environment_id: EnvironmentId,
        key: SecretKey,
        value: impl Into<String>,
        actor: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SecretId::new(),
            project_id,
            environment_id,
            key,
            value: value.into(),
            version: 1,
            updated_at: now,
            last_changed_by: actor.into(),
        }
    }

    /// Applies a value write in place.
    ///
    /// Every write bumps the version, including writes of an identical value.
    pub fn write_value(
        &mut self,
        value: impl Into<String>,
        actor: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        self.value = value.into();
        self.version = self.version.saturating_add(1);
        self.updated_at = now;
        self.last_changed_by = actor.into();
    }

    /// Marks this copy as confirmed current without touching value or version.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{Secret, SecretKey};
    use crate::{EnvironmentId, ProjectId};

    #[test]
    fn secret_key_accepts_upper_snake_case() {
        assert!(SecretKey::new("DATABASE_URL").is_ok());
        assert!(SecretKey::new("API_KEY_2").is_ok());
    }

    #[test]
    fn secret_key_rejects_malformed_input() {
        assert!(SecretKey::new("").is_err());
        assert!(SecretKey::new("database_url").is_err());
        assert!(SecretKey::new("API-KEY").is_err());
        assert!(SecretKey::new("API KEY").is_err());
    }

    #[test]
    fn identical_value_write_still_bumps_version() {
        let now = Utc::now();
        let key = SecretKey::new("TOKEN").unwrap_or_else(|_| unreachable!());
        let mut secret =
            Secret::first_version(ProjectId::new(), EnvironmentId::new(), key, "abc", "a", now);

        secret.write_value("abc", "b", now + Duration::seconds(1));

        assert_eq!(secret.version, 2);
        assert_eq!(secret.last_changed_by, "b");
    }

    #[test]
    fn touch_keeps_value_and_version() {
        let now = Utc::now();
        let key = SecretKey::new("TOKEN").unwrap_or_else(|_| unreachable!());
        let mut secret =
            Secret::first_version(ProjectId::new(), EnvironmentId::new(), key, "abc", "a", now);

        secret.touch(now + Duration::minutes(5));

        assert_eq!(secret.version, 1);
        assert_eq!(secret.value, "abc");
        assert_eq!(secret.updated_at, now + Duration::minutes(5));
    }
}
