use std::collections::BTreeSet;
use std::sync::Arc;

use envkeep_core::{AppError, AppResult, UserIdentity};
use envkeep_domain::{
    AuditAction, EmailAddress, EnvironmentId, MemberId, ProjectId, ProjectMember,
};
use tracing::info;

use crate::{
    AccessService, AuditEvent, AuditService, Clock, MemberRepository, ProjectRepository,
    UserDirectory,
};


/// Application service for project membership and environment grants.
#[derive(Clone)]
pub struct MemberService {
    access: AccessService,
    projects: Arc<dyn ProjectRepository>,
    members: Arc<dyn MemberRepository>,
    users: Arc<dyn UserDirectory>,
    audit: AuditService,
    clock: Arc<dyn Clock>,
}

impl MemberService {
    /// Creates a new member service from required dependencies.
    #[must_use]
    pub fn new(
        access: AccessService,
        projects: Arc<dyn ProjectRepository>,
        members: Arc<dyn MemberRepository>,
        users: Arc<dyn UserDirectory>,
        audit: AuditService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            access,
            projects,
            members,
            users,
            audit,
            clock,
        }
    }

    /// Lists a project's member rows.
    pub async fn list_members(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
    ) -> AppResult<Vec<ProjectMember>> {
        self.access.require_admin(actor)?;
        self.access.require_project(project_id).await?;
        self.members.list_members(project_id).await
    }

    /// Grants an email access to a set of environments.
    ///
    /// Registered emails become active members right away; others stay
    /// invited until the user first signs in.
    pub async fn add_member(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        email: &str,
        environments: BTreeSet<EnvironmentId>,
    ) -> AppResult<ProjectMember> {
        self.access.require_admin(actor)?;
        self.access.require_project(project_id).await?;
        let email = EmailAddress::new(email)?;
        self.require_project_environments(project_id, &environments)
            .await?;

        let user_id = self.users.find_user_id_by_email(&email).await?;
        let member = ProjectMember::invite(
            project_id,
            email,
            user_id,
            environments,
            self.clock.now(),
        );
        self.members.insert_member(member.clone()).await?;

        self.audit
            .record(
                actor,
                AuditEvent {
                    project_id,
                    environment_id: None,
                    secret_id: None,
                    action: AuditAction::MemberAdd,
                    description: format!("Added member {}", member.invite_email),
                },
            )
            .await?;

        Ok(member)
    }

    /// Replaces a member's environment grants.
    pub async fn update_member(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        member_id: MemberId,
        environments: BTreeSet<EnvironmentId>,
    ) -> AppResult<ProjectMember> {
        self.access.require_admin(actor)?;
        self.require_member(project_id, member_id).await?;
        self.require_project_environments(project_id, &environments)
            .await?;

        let member = self
            .members
            .update_member_environments(member_id, environments)
            .await?;

        self.audit
            .record(
                actor,
                AuditEvent {
                    project_id,
                    environment_id: None,
                    secret_id: None,
                    action: AuditAction::MemberUpdate,
                    description: format!("Updated access for member {}", member.label()),
                },
            )
            .await?;

        Ok(member)
    }

    /// Removes a member row.
    pub async fn remove_member(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        member_id: MemberId,
    ) -> AppResult<ProjectMember> {
        self.access.require_admin(actor)?;
        self.require_member(project_id, member_id).await?;

        let member = self.members.delete_member(member_id).await?;

        self.audit
            .record(
                actor,
                AuditEvent {
                    project_id,
                    environment_id: None,
                    secret_id: None,
                    action: AuditAction::MemberRemove,
                    description: format!("Removed member {}", member.label()),
                },
            )
            .await?;

        Ok(member)
    }

    /// Records the identity in the user directory and activates its pending invitations.
    ///
    /// Identities without an email are left untouched.
    pub async fn activate_invites(&self, identity: &UserIdentity) -> AppResult<u64> {
        let Some(email) = identity.email() else {
            return Ok(0);
        };
        let email = EmailAddress::new(email)?;

        self.users.remember_user(identity.subject(), &email).await?;
        let activated = self
            .members
            .activate_invites(&email, identity.subject())
            .await?;

        if activated > 0 {
            info!(subject = identity.subject(), activated, "pending invitations activated");
        }

        Ok(activated)
    }

    async fn require_member(
        &self,
        project_id: ProjectId,
        member_id: MemberId,
    ) -> AppResult<ProjectMember> {
        self.members
            .find_member_by_id(member_id)
            .await?
            .filter(|member| member.project_id == project_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "member '{member_id}' does not exist in project '{project_id}'"
                ))
            })
    }

    async fn require_project_environments(
        &self,
        project_id: ProjectId,
        environments: &BTreeSet<EnvironmentId>,
    ) -> AppResult<()> {
        let owned: BTreeSet<EnvironmentId> = self
            .projects
            .list_environments(project_id)
            .await?
            .into_iter()
            .map(|environment| environment.id)
            .collect();

        if let Some(foreign) = environments.difference(&owned).next() {
            return Err(AppError::Validation(format!(
                "environment '{foreign}' does not belong to project '{project_id}'"
            )));
        }

        Ok(())
    }
}
