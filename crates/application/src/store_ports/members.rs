use std::collections::BTreeSet;

use async_trait::async_trait;
use envkeep_core::AppResult;
use envkeep_domain::{EmailAddress, EnvironmentId, MemberId, ProjectId, ProjectMember};

/// Repository port for project membership rows.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Finds the member row linking a user to a project.
    async fn find_member(
        &self,
        project_id: ProjectId,
        user_id: &str,
    ) -> AppResult<Option<ProjectMember>>;

    /// Finds a member row by id.
    async fn find_member_by_id(&self, member_id: MemberId) -> AppResult<Option<ProjectMember>>;

    /// Lists a project's member rows ordered by invitation time.
    async fn list_members(&self, project_id: ProjectId) -> AppResult<Vec<ProjectMember>>;

    /// Lists every member row held by a user.
    async fn list_memberships(&self, user_id: &str) -> AppResult<Vec<ProjectMember>>;

    /// Persists a new member row.
    ///
    /// Fails with `Conflict` when the project already has a row for the
    /// same user id or invite email.
    async fn insert_member(&self, member: ProjectMember) -> AppResult<()>;

    /// Replaces a member's environment grants.
    async fn update_member_environments(
        &self,
        member_id: MemberId,
        environments: BTreeSet<EnvironmentId>,
    ) -> AppResult<ProjectMember>;

    /// Removes a member row and returns it.
    async fn delete_member(&self, member_id: MemberId) -> AppResult<ProjectMember>;

    /// Links pending invitations for an email to a registered user.
    ///
    /// Returns the number of rows activated.
    async fn activate_invites(&self, email: &EmailAddress, user_id: &str) -> AppResult<u64>;
}

/// Port for resolving registered users by email.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns the user id registered for an email.
    async fn find_user_id_by_email(&self, email: &EmailAddress) -> AppResult<Option<String>>;

    /// Records a user seen at the identity boundary.
    async fn remember_user(&self, user_id: &str, email: &EmailAddress) -> AppResult<()>;
}
