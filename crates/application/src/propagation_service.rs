use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::{info, warn};

use envkeep_core::{AppError, AppResult, UserIdentity};
use envkeep_domain::{Environment, EnvironmentId, ProjectId, RegistryEntry, Secret, SecretKey};

use crate::{AccessService, Clock, RegistryService, SecretService};

mod edit_session;

pub use edit_session::EditSession;


/// Value written to the source environment and offered to the others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedValue {
    /// Secret key.
    pub key: SecretKey,
    /// Committed value.
    pub value: String,
}

/// Offer to broadcast freshly committed values to other environments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationOffer {
    /// Project scope.
    pub project_id: ProjectId,
    /// Environment the values were committed to.
    pub source_environment_id: EnvironmentId,
    /// Environments the values may be pushed to.
    pub targets: Vec<Environment>,
    /// Values to push.
    pub values: Vec<CommittedValue>,
}

/// Result of a fully successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Secrets written to the session environment.
    pub committed: Vec<Secret>,
    /// Registry entries whose description changed.
    pub described: Vec<RegistryEntry>,
    /// Present iff at least one value was committed.
    pub offer: Option<PropagationOffer>,
}

/// Commit failure, distinguishing "nothing written" from "partially written".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// The commit failed before any write landed.
    #[error(transparent)]
    Rejected(#[from] AppError),
    /// The commit stopped partway; earlier writes stay written.
    #[error(
        "commit stopped at '{key}' after {} write(s) landed: {source}",
        .committed.len() + .described.len()
    )]
    Partial {
        /// Secrets written before the failure.
        committed: Vec<Secret>,
        /// Keys whose description was updated before the failure.
        described: Vec<SecretKey>,
        /// Key whose write failed.
        key: SecretKey,
        /// Underlying failure.
        source: AppError,
    },
}

impl CommitError {
    /// Keys whose value or description write landed before the failure.
    #[must_use]
    pub fn landed_keys(&self) -> Vec<SecretKey> {
        match self {
            Self::Rejected(_) => Vec::new(),
            Self::Partial {
                committed,
                described,
                ..
            } => committed
                .iter()
                .map(|secret| secret.key.clone())
                .chain(described.iter().cloned())
                .collect(),
        }
    }

    /// Underlying application error.
    #[must_use]
    pub fn app_error(&self) -> &AppError {
        match self {
            Self::Rejected(error) => error,
            Self::Partial { source, .. } => source,
        }
    }
}

/// One failed (environment, key) write during propagation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationFailure {
    /// Target environment.
    pub environment_id: EnvironmentId,
    /// Key that failed.
    pub key: SecretKey,
    /// Failure cause.
    pub error: AppError,
}

/// Aggregate outcome of a propagation batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationReport {
    /// Targets the batch was sent to.
    pub targets: Vec<EnvironmentId>,
    /// Secrets written successfully.
    pub applied: Vec<Secret>,
    /// Writes that failed.
    pub failures: Vec<PropagationFailure>,
}

impl PropagationReport {
    /// Returns whether every write succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Targets that received every value.
    #[must_use]
    pub fn succeeded_targets(&self) -> Vec<EnvironmentId> {
        let failed = self.failed_target_set();
        self.targets
            .iter()
            .copied()
            .filter(|target| !failed.contains(target))
            .collect()
    }

    /// Targets with at least one failed write.
    #[must_use]
    pub fn failed_targets(&self) -> Vec<EnvironmentId> {
        self.failed_target_set().into_iter().collect()
    }

    fn failed_target_set(&self) -> BTreeSet<EnvironmentId> {
        self.failures
            .iter()
            .map(|failure| failure.environment_id)
            .collect()
    }
}

/// Coordinates multi-secret commits and the optional broadcast that follows.
#[derive(Clone)]
pub struct PropagationService {
    access: AccessService,
    registry: RegistryService,
    secrets: SecretService,
    clock: Arc<dyn Clock>,
}

impl PropagationService {
    /// Creates a new propagation service.
    #[must_use]
    pub fn new(
        access: AccessService,
        registry: RegistryService,
        secrets: SecretService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            access,
            registry,
            secrets,
            clock,
        }
    }

    /// Opens an edit session seeded with the environment's stored state.
    pub async fn open_session(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        environment_id: EnvironmentId,
    ) -> AppResult<EditSession> {
        self.access
            .require_project_environment(actor, project_id, environment_id)
            .await?;

        let stored_values: BTreeMap<SecretKey, String> = self
            .secrets
            .list_secrets(actor, project_id, Some(environment_id))
            .await?
            .into_iter()
            .map(|secret| (secret.key, secret.value))
            .collect();
        let stored_descriptions: BTreeMap<SecretKey, String> = self
            .registry
            .entries(project_id)
            .await?
            .into_iter()
            .map(|entry| (entry.key, entry.description))
            .collect();

        Ok(EditSession::new(
            project_id,
            environment_id,
            stored_values,
            stored_descriptions,
        ))
    }

    /// Writes every value draft to the session environment, then every description draft.
    ///
    /// Writes run one at a time in key order. The session is consumed
    /// whatever the outcome; an empty session writes nothing.
    pub async fn commit(
        &self,
        actor: &UserIdentity,
        session: EditSession,
    ) -> Result<CommitOutcome, CommitError> {
        let project_id = session.project_id();
        let environment_id = session.environment_id();
        self.access
            .require_project_environment(actor, project_id, environment_id)
            .await?;
        if session.is_empty() {
            return Ok(CommitOutcome {
                committed: Vec::new(),
                described: Vec::new(),
                offer: None,
            });
        }

        let targets = self
            .offer_targets(actor, project_id, environment_id)
            .await?;

        let mut committed = Vec::with_capacity(session.value_drafts().len());
        let mut described = Vec::with_capacity(session.description_drafts().len());

        for (key, value) in session.value_drafts() {
            match self
                .secrets
                .save_secret(actor, project_id, environment_id, key.as_str(), value)
                .await
            {
                Ok(secret) => committed.push(secret),
                Err(error) => {
                    return Err(partial_commit(committed, &described, key, error));
                }
            }
        }

        for (key, description) in session.description_drafts() {
            match self
                .registry
                .update_description(actor, project_id, key.as_str(), description)
                .await
            {
                Ok(entry) => described.push(entry),
                Err(error) => {
                    return Err(partial_commit(committed, &described, key, error));
                }
            }
        }

        let offer = (!committed.is_empty()).then(|| PropagationOffer {
            project_id,
            source_environment_id: environment_id,
            targets,
            values: committed
                .iter()
                .map(|secret| CommittedValue {
                    key: secret.key.clone(),
                    value: secret.value.clone(),
                })
                .collect(),
        });

        Ok(CommitOutcome {
            committed,
            described,
            offer,
        })
    }

    /// Builds the propagation offer for values committed to `source_environment_id`.
    ///
    /// Returns `None` when there is nothing to propagate. The source must be
    /// a visible environment of the project.
    pub async fn offer(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        source_environment_id: EnvironmentId,
        values: Vec<CommittedValue>,
    ) -> AppResult<Option<PropagationOffer>> {
        self.access
            .require_project_environment(actor, project_id, source_environment_id)
            .await?;

        if values.is_empty() {
            return Ok(None);
        }

        let targets = self
            .offer_targets(actor, project_id, source_environment_id)
            .await?;

        Ok(Some(PropagationOffer {
            project_id,
            source_environment_id,
            targets,
            values,
        }))
    }

    async fn offer_targets(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        source_environment_id: EnvironmentId,
    ) -> AppResult<Vec<Environment>> {
        Ok(self
            .access
            .visible_environments(actor, project_id)
            .await?
            .into_iter()
            .filter(|environment| environment.id != source_environment_id)
            .collect())
    }

    /// Broadcasts every offered value to every selected target.
    ///
    /// Each (target, key) write is independent and dispatched concurrently;
    /// failures are collected rather than aborting the batch. All writes in
    /// the batch share one timestamp.
    pub async fn propagate(
        &self,
        actor: &UserIdentity,
        offer: &PropagationOffer,
        selected: &[EnvironmentId],
    ) -> AppResult<PropagationReport> {
        let targets = select_targets(offer, selected)?;
        let written_at = self.clock.now();

        let writes = targets.iter().flat_map(move |target| {
            offer.values.iter().map(move |committed| async move {
                let result = self
                    .secrets
                    .save_secret_at(
                        actor,
                        offer.project_id,
                        *target,
                        committed.key.as_str(),
                        committed.value.as_str(),
                        written_at,
                    )
                    .await;
                (*target, committed.key.clone(), result)
            })
        });

        let mut report = PropagationReport {
            targets: targets.clone(),
            applied: Vec::new(),
            failures: Vec::new(),
        };

        for (environment_id, key, result) in join_all(writes).await {
            match result {
                Ok(secret) => report.applied.push(secret),
                Err(error) => {
                    warn!(
                        environment_id = %environment_id,
                        key = %key,
                        error = %error,
                        "propagation write failed"
                    );
                    report.failures.push(PropagationFailure {
                        environment_id,
                        key,
                        error,
                    });
                }
            }
        }

        info!(
            project_id = %offer.project_id,
            targets = report.targets.len(),
            applied = report.applied.len(),
            failed = report.failures.len(),
            "propagation finished"
        );

        Ok(report)
    }
}

fn partial_commit(
    committed: Vec<Secret>,
    described: &[RegistryEntry],
    key: &SecretKey,
    source: AppError,
) -> CommitError {
    if committed.is_empty() && described.is_empty() {
        return CommitError::Rejected(source);
    }

    CommitError::Partial {
        committed,
        described: described.iter().map(|entry| entry.key.clone()).collect(),
        key: key.clone(),
        source,
    }
}

fn select_targets(
    offer: &PropagationOffer,
    selected: &[EnvironmentId],
) -> AppResult<Vec<EnvironmentId>> {
    if selected.is_empty() {
        return Err(AppError::Validation(
            "select at least one target environment".to_owned(),
        ));
    }

    let offered: BTreeSet<EnvironmentId> =
        offer.targets.iter().map(|environment| environment.id).collect();
    let mut targets = Vec::with_capacity(selected.len());
    for environment_id in selected {
        if !offered.contains(environment_id) {
            return Err(AppError::Validation(format!(
                "environment '{environment_id}' is not a propagation target"
            )));
        }
        if !targets.contains(environment_id) {
            targets.push(*environment_id);
        }
    }

    Ok(targets)
}
