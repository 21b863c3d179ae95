use std::collections::HashMap;

use envkeep_domain::{
    AuditLogEntry, EmailAddress, Environment, Project, ProjectId, ProjectMember, RegistryEntry,
    Secret, SecretId, SecretKey,
};
use tokio::sync::RwLock;

mod audit;
mod members;
mod projects;
mod registry;
mod secrets;

#[cfg(test)]
mod tests;

/// In-memory implementation of every storage port.
///
/// Used for local development and tests; state is lost on restart. Locks
/// are always taken in field declaration order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    projects: RwLock<HashMap<ProjectId, Project>>,
    environments: RwLock<Vec<Environment>>,
    secrets: RwLock<HashMap<SecretId, Secret>>,
    registry: RwLock<HashMap<(ProjectId, SecretKey), RegistryEntry>>,
    members: RwLock<Vec<ProjectMember>>,
    users: RwLock<HashMap<String, EmailAddress>>,
    audit_entries: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
