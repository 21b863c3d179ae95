use std::collections::BTreeMap;
use std::sync::Arc;

use envkeep_core::{AppResult, UserIdentity};
use envkeep_domain::{Project, SecretKey};

use crate::{AccessService, SecretRepository};


/// Queries shorter than this return no results.
pub const MIN_SEARCH_QUERY_LEN: usize = 2;

/// Secret key hit grouped across projects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretKeyHit {
    /// Matching key.
    pub key: SecretKey,
    /// Visible projects holding the key in at least one visible environment.
    pub used_in: Vec<Project>,
    /// Number of visible environment copies of the key.
    pub usage_count: usize,
}

/// Global search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    /// Projects whose name or slug matches.
    pub projects: Vec<Project>,
    /// Secret keys that match, ordered by key.
    pub secrets: Vec<SecretKeyHit>,
}

/// Case-insensitive substring search over visible projects and secret keys.
#[derive(Clone)]
pub struct SearchService {
    access: AccessService,
    secrets: Arc<dyn SecretRepository>,
}

impl SearchService {
    /// Creates a new search service.
    #[must_use]
    pub fn new(access: AccessService, secrets: Arc<dyn SecretRepository>) -> Self {
        Self { access, secrets }
    }

    /// Searches projects and secret keys visible to `actor`.
    pub async fn search(&self, actor: &UserIdentity, query: &str) -> AppResult<SearchResults> {
        let needle = query.trim().to_lowercase();
        if needle.chars().count() < MIN_SEARCH_QUERY_LEN {
            return Ok(SearchResults::default());
        }

        let mut results = SearchResults::default();
        let mut hits: BTreeMap<SecretKey, SecretKeyHit> = BTreeMap::new();

        for project in self.access.visible_projects(actor).await? {
            if project.name.as_str().to_lowercase().contains(&needle)
                || project.slug.as_str().contains(&needle)
            {
                results.projects.push(project.clone());
            }

            let visible = self
                .access
                .visible_environment_ids(actor, project.id)
                .await?;
            let matching = self
                .secrets
                .list_secrets(project.id, None)
                .await?
                .into_iter()
                .filter(|secret| {
                    visible
                        .as_ref()
                        .is_none_or(|ids| ids.contains(&secret.environment_id))
                })
                .filter(|secret| secret.key.as_str().to_lowercase().contains(&needle));

            for secret in matching {
                let hit = hits.entry(secret.key.clone()).or_insert_with(|| SecretKeyHit {
                    key: secret.key.clone(),
                    used_in: Vec::new(),
                    usage_count: 0,
                });
                hit.usage_count += 1;
                if !hit.used_in.iter().any(|used| used.id == project.id) {
                    hit.used_in.push(project.clone());
                }
            }
        }

        results.secrets = hits.into_values().collect();
        Ok(results)
    }
}
