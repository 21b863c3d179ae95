use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Mutex;

use envkeep_core::{AppError, AppResult, UserIdentity};
use envkeep_domain::{
    AuditLogEntry, EmailAddress, Environment, EnvironmentId, MemberId, MemberStatus, Project,
    ProjectId, ProjectMember, RegistryEntry, Secret, SecretId, SecretKey,
};

use crate::{
    AccessService, AuditLogQuery, AuditRepository, AuditService, Clock, MemberRepository,
    MemberService, ProjectRepository, ProjectService, PropagationService, RegistryEntryPatch,
    RegistryRepository, RegistryService, SearchService, SecretRepository, SecretService,
    SecretWrite, SyncService, UserDirectory,
};

/// Clock advancing one second on every read.
pub(crate) struct StepClock {
    base: DateTime<Utc>,
    ticks: AtomicI64,
}

impl StepClock {
    pub(crate) fn new() -> Self {
        Self {
            base: Utc
                .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_else(|| unreachable!()),
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.base + Duration::seconds(tick)
    }
}

#[derive(Default)]
pub(crate) struct FakeStore {
    projects: Mutex<Vec<Project>>,
    environments: Mutex<Vec<Environment>>,
    secrets: Mutex<Vec<Secret>>,
    registry: Mutex<Vec<RegistryEntry>>,
    audit: Mutex<Vec<AuditLogEntry>>,
    members: Mutex<Vec<ProjectMember>>,
    users: Mutex<Vec<(String, EmailAddress)>>,
    pub(crate) fail_registry: AtomicBool,
    pub(crate) fail_audit: AtomicBool,
    pub(crate) failing_environments: Mutex<BTreeSet<EnvironmentId>>,
    pub(crate) failing_keys: Mutex<BTreeSet<SecretKey>>,
}

impl FakeStore {
    pub(crate) async fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.audit.lock().await.clone()
    }

    pub(crate) async fn register_user(&self, user_id: &str, email: &str) {
        let email = EmailAddress::new(email).unwrap_or_else(|_| unreachable!());
        self.users.lock().await.push((user_id.to_owned(), email));
    }
}

#[async_trait]
impl ProjectRepository for FakeStore {
    async fn create_project(
        &self,
        project: Project,
        environments: Vec<Environment>,
    ) -> AppResult<()> {
        self.projects.lock().await.push(project);
        self.environments.lock().await.extend(environments);
        Ok(())
    }

    async fn list_projects(&self) -> AppResult<Vec<Project>> {
        Ok(self.projects.lock().await.clone())
    }

    async fn find_project(&self, project_id: ProjectId) -> AppResult<Option<Project>> {
        Ok(self
            .projects
            .lock()
            .await
            .iter()
            .find(|project| project.id == project_id)
            .cloned())
    }

    async fn find_project_by_slug(&self, slug: &str) -> AppResult<Option<Project>> {
        Ok(self
            .projects
            .lock()
            .await
            .iter()
            .find(|project| project.slug.as_str() == slug)
            .cloned())
    }

    async fn list_environments(&self, project_id: ProjectId) -> AppResult<Vec<Environment>> {
        Ok(self
            .environments
            .lock()
            .await
            .iter()
            .filter(|environment| environment.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn find_environment(
        &self,
        environment_id: EnvironmentId,
    ) -> AppResult<Option<Environment>> {
        Ok(self
            .environments
            .lock()
            .await
            .iter()
            .find(|environment| environment.id == environment_id)
            .cloned())
    }

    async fn create_environment(&self, environment: Environment) -> AppResult<()> {
        self.environments.lock().await.push(environment);
        Ok(())
    }

    async fn delete_environment(&self, environment_id: EnvironmentId) -> AppResult<u64> {
        self.environments
            .lock()
            .await
            .retain(|environment| environment.id != environment_id);
        let mut secrets = self.secrets.lock().await;
        let before = secrets.len();
        secrets.retain(|secret| secret.environment_id != environment_id);
        Ok((before - secrets.len()) as u64)
    }
}

#[async_trait]
impl SecretRepository for FakeStore {
    async fn list_secrets(
        &self,
        project_id: ProjectId,
        environment_id: Option<EnvironmentId>,
    ) -> AppResult<Vec<Secret>> {
        Ok(self
            .secrets
            .lock()
            .await
            .iter()
            .filter(|secret| secret.project_id == project_id)
            .filter(|secret| environment_id.is_none_or(|id| secret.environment_id == id))
            .cloned()
            .collect())
    }

    async fn list_secrets_by_key(
        &self,
        project_id: ProjectId,
        key: &SecretKey,
    ) -> AppResult<Vec<Secret>> {
        Ok(self
            .secrets
            .lock()
            .await
            .iter()
            .filter(|secret| secret.project_id == project_id && &secret.key == key)
            .cloned()
            .collect())
    }

    async fn find_secret(&self, secret_id: SecretId) -> AppResult<Option<Secret>> {
        Ok(self
            .secrets
            .lock()
            .await
            .iter()
            .find(|secret| secret.id == secret_id)
            .cloned())
    }

    async fn upsert_secret(&self, write: SecretWrite) -> AppResult<Secret> {
        if self
            .failing_environments
            .lock()
            .await
            .contains(&write.environment_id)
            || self.failing_keys.lock().await.contains(&write.key)
        {
            return Err(AppError::Storage("secret write unavailable".to_owned()));
        }

        let mut secrets = self.secrets.lock().await;
        if let Some(secret) = secrets.iter_mut().find(|secret| {
            secret.environment_id == write.environment_id && secret.key == write.key
        }) {
            secret.write_value(write.value, write.actor, write.written_at);
            return Ok(secret.clone());
        }

        let secret = Secret::first_version(
            write.project_id,
            write.environment_id,
            write.key,
            write.value,
            write.actor,
            write.written_at,
        );
        secrets.push(secret.clone());
        Ok(secret)
    }

    async fn touch_secret(&self, secret_id: SecretId, at: DateTime<Utc>) -> AppResult<Secret> {
        let mut secrets = self.secrets.lock().await;
        let secret = secrets
            .iter_mut()
            .find(|secret| secret.id == secret_id)
            .ok_or_else(|| AppError::NotFound("secret".to_owned()))?;
        secret.touch(at);
        Ok(secret.clone())
    }

    async fn delete_secret(&self, secret_id: SecretId) -> AppResult<Secret> {
        let mut secrets = self.secrets.lock().await;
        let index = secrets
            .iter()
            .position(|secret| secret.id == secret_id)
            .ok_or_else(|| AppError::NotFound("secret".to_owned()))?;
        Ok(secrets.remove(index))
    }
}

#[async_trait]
impl RegistryRepository for FakeStore {
    async fn list_entries(&self, project_id: ProjectId) -> AppResult<Vec<RegistryEntry>> {
        let mut entries: Vec<RegistryEntry> = self
            .registry
            .lock()
            .await
            .iter()
            .filter(|entry| entry.project_id == project_id)
            .cloned()
            .collect();
        entries.sort_by(|left, right| left.key.cmp(&right.key));
        Ok(entries)
    }

    async fn find_entry(
        &self,
        project_id: ProjectId,
        key: &SecretKey,
    ) -> AppResult<Option<RegistryEntry>> {
        Ok(self
            .registry
            .lock()
            .await
            .iter()
            .find(|entry| entry.project_id == project_id && &entry.key == key)
            .cloned())
    }

    async fn upsert_entry(
        &self,
        project_id: ProjectId,
        key: &SecretKey,
        patch: RegistryEntryPatch,
    ) -> AppResult<RegistryEntry> {
        if self.fail_registry.load(Ordering::SeqCst) {
            return Err(AppError::Storage("registry unavailable".to_owned()));
        }

        let mut registry = self.registry.lock().await;
        let index = match registry
            .iter()
            .position(|entry| entry.project_id == project_id && &entry.key == key)
        {
            Some(index) => index,
            None => {
                registry.push(RegistryEntry::described(project_id, key.clone(), ""));
                registry.len() - 1
            }
        };

        let entry = &mut registry[index];
        if let Some(description) = patch.description {
            entry.description = description;
        }
        if let Some(at) = patch.last_updated_at {
            entry.record_write(at);
        }
        Ok(entry.clone())
    }
}

#[async_trait]
impl AuditRepository for FakeStore {
    async fn append_entry(&self, entry: AuditLogEntry) -> AppResult<()> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(AppError::Storage("audit unavailable".to_owned()));
        }
        self.audit.lock().await.push(entry);
        Ok(())
    }

    async fn list_audit_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        Ok(self
            .audit
            .lock()
            .await
            .iter()
            .rev()
            .filter(|entry| entry.project_id == query.project_id)
            .filter(|entry| {
                query
                    .environment_id
                    .is_none_or(|id| entry.environment_id == Some(id))
            })
            .filter(|entry| {
                query.visible_environment_ids.as_ref().is_none_or(|ids| {
                    entry
                        .environment_id
                        .is_some_and(|environment_id| ids.contains(&environment_id))
                })
            })
            .filter(|entry| query.secret_id.is_none_or(|id| entry.secret_id == Some(id)))
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MemberRepository for FakeStore {
    async fn find_member(
        &self,
        project_id: ProjectId,
        user_id: &str,
    ) -> AppResult<Option<ProjectMember>> {
        Ok(self
            .members
            .lock()
            .await
            .iter()
            .find(|member| {
                member.project_id == project_id && member.user_id.as_deref() == Some(user_id)
            })
            .cloned())
    }

    async fn find_member_by_id(&self, member_id: MemberId) -> AppResult<Option<ProjectMember>> {
        Ok(self
            .members
            .lock()
            .await
            .iter()
            .find(|member| member.id == member_id)
            .cloned())
    }

    async fn list_members(&self, project_id: ProjectId) -> AppResult<Vec<ProjectMember>> {
        Ok(self
            .members
            .lock()
            .await
            .iter()
            .filter(|member| member.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn list_memberships(&self, user_id: &str) -> AppResult<Vec<ProjectMember>> {
        Ok(self
            .members
            .lock()
            .await
            .iter()
            .filter(|member| member.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect())
    }

    async fn insert_member(&self, member: ProjectMember) -> AppResult<()> {
        let mut members = self.members.lock().await;
        if members.iter().any(|existing| {
            existing.project_id == member.project_id
                && (existing.invite_email == member.invite_email
                    || (member.user_id.is_some() && existing.user_id == member.user_id))
        }) {
            return Err(AppError::Conflict(
                "User is already a member of this project".to_owned(),
            ));
        }
        members.push(member);
        Ok(())
    }

    async fn update_member_environments(
        &self,
        member_id: MemberId,
        environments: BTreeSet<EnvironmentId>,
    ) -> AppResult<ProjectMember> {
        let mut members = self.members.lock().await;
        let member = members
            .iter_mut()
            .find(|member| member.id == member_id)
            .ok_or_else(|| AppError::NotFound("member".to_owned()))?;
        member.environments = environments;
        Ok(member.clone())
    }

    async fn delete_member(&self, member_id: MemberId) -> AppResult<ProjectMember> {
        let mut members = self.members.lock().await;
        let index = members
            .iter()
            .position(|member| member.id == member_id)
            .ok_or_else(|| AppError::NotFound("member".to_owned()))?;
        Ok(members.remove(index))
    }

    async fn activate_invites(&self, email: &EmailAddress, user_id: &str) -> AppResult<u64> {
        let mut activated = 0;
        for member in self.members.lock().await.iter_mut() {
            if member.status == MemberStatus::Invited && &member.invite_email == email {
                member.status = MemberStatus::Active;
                member.user_id = Some(user_id.to_owned());
                activated += 1;
            }
        }
        Ok(activated)
    }
}

#[async_trait]
impl UserDirectory for FakeStore {
    async fn find_user_id_by_email(&self, email: &EmailAddress) -> AppResult<Option<String>> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|(_, known)| known == email)
            .map(|(user_id, _)| user_id.clone()))
    }

    async fn remember_user(&self, user_id: &str, email: &EmailAddress) -> AppResult<()> {
        let mut users = self.users.lock().await;
        if !users.iter().any(|(known, _)| known == user_id) {
            users.push((user_id.to_owned(), email.clone()));
        }
        Ok(())
    }
}

pub(crate) struct Fixture {
    pub(crate) store: Arc<FakeStore>,
    pub(crate) secrets: SecretService,
    pub(crate) registry: RegistryService,
    pub(crate) sync: SyncService,
    pub(crate) propagation: PropagationService,
    pub(crate) projects: ProjectService,
    pub(crate) members: MemberService,
    pub(crate) search: SearchService,
    pub(crate) audit: AuditService,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let store = Arc::new(FakeStore::default());
        let clock: Arc<dyn Clock> = Arc::new(StepClock::new());

        let access = AccessService::new(store.clone(), store.clone());
        let audit = AuditService::new(access.clone(), store.clone(), clock.clone());
        let registry = RegistryService::new(access.clone(), store.clone());
        let secrets = SecretService::new(
            access.clone(),
            store.clone(),
            registry.clone(),
            audit.clone(),
            clock.clone(),
        );

        Self {
            sync: SyncService::new(access.clone(), registry.clone(), store.clone()),
            propagation: PropagationService::new(
                access.clone(),
                registry.clone(),
                secrets.clone(),
                clock.clone(),
            ),
            projects: ProjectService::new(access.clone(), store.clone(), audit.clone()),
            members: MemberService::new(
                access.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
                audit.clone(),
                clock,
            ),
            search: SearchService::new(access, store.clone()),
            registry,
            secrets,
            audit,
            store,
        }
    }

    /// Creates a project with Development, Staging and Production.
    pub(crate) async fn seed_project(&self, name: &str) -> (Project, Vec<Environment>) {
        let view = self
            .projects
            .create_project(&admin(), name, "")
            .await
            .unwrap_or_else(|_| unreachable!());
        (view.project, view.environments)
    }
}

pub(crate) fn admin() -> UserIdentity {
    UserIdentity::new("admin-1", Some("admin@example.com".to_owned()), true)
}

pub(crate) fn developer() -> UserIdentity {
    UserIdentity::new("dev-1", Some("dev@example.com".to_owned()), false)
}
