use envkeep_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{EnvironmentId, ProjectId};

/// URL-safe identifier made of lowercase ASCII letters, digits, `-` and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Validates an explicit slug.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into().trim().to_lowercase();
        if value.is_empty() {
            return Err(AppError::Validation("slug must not be empty".to_owned()));
        }

        if !value
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || matches!(character, '-' | '_'))
        {
            return Err(AppError::Validation(format!(
                "slug '{value}' may only contain lowercase letters, digits, '-' and '_'"
            )));
        }

        Ok(Self(value))
    }

    /// Derives a slug from a display name.
    ///
    /// Whitespace runs become a single `-`; characters outside the slug
    /// alphabet are dropped.
    pub fn from_name(name: &str) -> AppResult<Self> {
        let mut slug = String::with_capacity(name.len());
        let mut pending_separator = false;

        for character in name.trim().chars() {
            if character.is_whitespace() {
                pending_separator = true;
                continue;
            }

            let lowered = character.to_ascii_lowercase();
            if !(lowered.is_ascii_alphanumeric() || matches!(lowered, '-' | '_')) {
                continue;
            }

            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(lowered);
        }

        if slug.is_empty() {
            return Err(AppError::Validation(format!(
                "name '{name}' does not produce a usable slug"
            )));
        }

        Ok(Self(slug))
    }

    /// Returns the slug string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for Slug {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Slug> for String {
    fn from(value: Slug) -> Self {
        value.0
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Project grouping environments and their secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Stable project id.
    pub id: ProjectId,
    /// Display name.
    pub name: NonEmptyString,
    /// Globally unique slug.
    pub slug: Slug,
    /// Free-text description.
    pub description: String,
}

impl Project {
    /// Creates a project with a slug derived from its name.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> AppResult<Self> {
        let name = NonEmptyString::new(name)?;
        let slug = Slug::from_name(name.as_str())?;

        Ok(Self {
            id: ProjectId::new(),
            name,
            slug,
            description: description.into(),
        })
    }
}

/// Deployment environment owned by one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Stable environment id.
    pub id: EnvironmentId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Display name.
    pub name: NonEmptyString,
    /// Slug, unique within the project.
    pub slug: Slug,
    /// Marks production environments.
    pub is_production: bool,
    /// Parent environment for hierarchical environments.
    pub parent_id: Option<EnvironmentId>,
}

impl Environment {
    /// Creates an environment in a project.
    pub fn new(
        project_id: ProjectId,
        name: impl Into<String>,
        slug: impl Into<String>,
        is_production: bool,
        parent_id: Option<EnvironmentId>,
    ) -> AppResult<Self> {
        Ok(Self {
            id: EnvironmentId::new(),
            project_id,
            name: NonEmptyString::new(name)?,
            slug: Slug::new(slug)?,
            is_production,
            parent_id,
        })
    }

    /// Builds the Development, Staging and Production environments every new project gets.
    pub fn defaults_for(project_id: ProjectId) -> AppResult<Vec<Self>> {
        [
            ("Development", false),
            ("Staging", false),
            ("Production", true),
        ]
        .into_iter()
        .map(|(name, is_production)| {
            Self::new(project_id, name, name.to_lowercase(), is_production, None)
        })
        .collect()
    }
}
