use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use envkeep_application::{MemberRepository, UserDirectory};
use envkeep_core::{AppError, AppResult};
use envkeep_domain::{
    EmailAddress, EnvironmentId, MemberId, MemberStatus, ProjectId, ProjectMember,
};

/// PostgreSQL-backed repository for project membership and known users.
#[derive(Clone)]
pub struct PostgresMemberRepository {
    pool: PgPool,
}

impl PostgresMemberRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct MemberRow {
    id: Uuid,
    project_id: Uuid,
    user_id: Option<String>,
    invite_email: String,
    environment_ids: Vec<Uuid>,
    status: String,
    invited_at: DateTime<Utc>,
}

impl MemberRow {
    fn into_member(self) -> AppResult<ProjectMember> {
        Ok(ProjectMember {
            id: MemberId::from_uuid(self.id),
            project_id: ProjectId::from_uuid(self.project_id),
            user_id: self.user_id,
            invite_email: EmailAddress::new(self.invite_email)?,
            environments: self
                .environment_ids
                .into_iter()
                .map(EnvironmentId::from_uuid)
                .collect(),
            status: MemberStatus::parse(self.status.as_str())?,
            invited_at: self.invited_at,
        })
    }
}

fn environment_uuids(environments: &BTreeSet<EnvironmentId>) -> Vec<Uuid> {
    environments
        .iter()
        .map(|environment_id| environment_id.as_uuid())
        .collect()
}

#[async_trait]
impl MemberRepository for PostgresMemberRepository {
    async fn find_member(
        &self,
        project_id: ProjectId,
        user_id: &str,
    ) -> AppResult<Option<ProjectMember>> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, project_id, user_id, invite_email, environment_ids, status, invited_at
            FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to find membership of '{user_id}' in project '{project_id}': {error}"
            ))
        })?;

        row.map(MemberRow::into_member).transpose()
    }

    async fn find_member_by_id(&self, member_id: MemberId) -> AppResult<Option<ProjectMember>> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, project_id, user_id, invite_email, environment_ids, status, invited_at
            FROM project_members
            WHERE id = $1
            "#,
        )
        .bind(member_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!("failed to find member '{member_id}': {error}"))
        })?;

        row.map(MemberRow::into_member).transpose()
    }

    async fn list_members(&self, project_id: ProjectId) -> AppResult<Vec<ProjectMember>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, project_id, user_id, invite_email, environment_ids, status, invited_at
            FROM project_members
            WHERE project_id = $1
            ORDER BY invited_at
            "#,
        )
        .bind(project_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to list members of project '{project_id}': {error}"
            ))
        })?;

        rows.into_iter().map(MemberRow::into_member).collect()
    }

    async fn list_memberships(&self, user_id: &str) -> AppResult<Vec<ProjectMember>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, project_id, user_id, invite_email, environment_ids, status, invited_at
            FROM project_members
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to list memberships of '{user_id}': {error}"
            ))
        })?;

        rows.into_iter().map(MemberRow::into_member).collect()
    }

    async fn insert_member(&self, member: ProjectMember) -> AppResult<()> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO project_members (
                id, project_id, user_id, invite_email, environment_ids, status, invited_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(member.id.as_uuid())
        .bind(member.project_id.as_uuid())
        .bind(member.user_id.as_deref())
        .bind(member.invite_email.as_str())
        .bind(environment_uuids(&member.environments))
        .bind(member.status.as_str())
        .bind(member.invited_at)
        .execute(&self.pool)
        .await;

        if let Err(error) = inserted {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23505")
            {
                return Err(AppError::Conflict(format!(
                    "'{}' is already a member of project '{}'",
                    member.invite_email, member.project_id
                )));
            }

            return Err(AppError::Storage(format!(
                "failed to add member '{}' to project '{}': {error}",
                member.invite_email, member.project_id
            )));
        }

        Ok(())
    }

    async fn update_member_environments(
        &self,
        member_id: MemberId,
        environments: BTreeSet<EnvironmentId>,
    ) -> AppResult<ProjectMember> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            UPDATE project_members
            SET environment_ids = $2
            WHERE id = $1
            RETURNING id, project_id, user_id, invite_email, environment_ids, status, invited_at
            "#,
        )
        .bind(member_id.as_uuid())
        .bind(environment_uuids(&environments))
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to update environments of member '{member_id}': {error}"
            ))
        })?;

        row.ok_or_else(|| AppError::NotFound(format!("member '{member_id}' does not exist")))?
            .into_member()
    }

    async fn delete_member(&self, member_id: MemberId) -> AppResult<ProjectMember> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            DELETE FROM project_members
            WHERE id = $1
            RETURNING id, project_id, user_id, invite_email, environment_ids, status, invited_at
            "#,
        )
        .bind(member_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!("failed to remove member '{member_id}': {error}"))
        })?;

        row.ok_or_else(|| AppError::NotFound(format!("member '{member_id}' does not exist")))?
            .into_member()
    }

    async fn activate_invites(&self, email: &EmailAddress, user_id: &str) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE project_members AS invite
            SET status = 'ACTIVE', user_id = $2
            WHERE invite.invite_email = $1
                AND invite.status = 'INVITED'
                AND NOT EXISTS (
                    SELECT 1
                    FROM project_members AS existing
                    WHERE existing.project_id = invite.project_id
                        AND existing.user_id = $2
                )
            "#,
        )
        .bind(email.as_str())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!(
                "failed to activate invites for '{email}': {error}"
            ))
        })?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl UserDirectory for PostgresMemberRepository {
    async fn find_user_id_by_email(&self, email: &EmailAddress) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT user_id
            FROM directory_users
            WHERE email = $1
            ORDER BY first_seen_at, user_id
            LIMIT 1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!("failed to look up user '{email}': {error}"))
        })
    }

    async fn remember_user(&self, user_id: &str, email: &EmailAddress) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO directory_users (user_id, email)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET email = EXCLUDED.email
            "#,
        )
        .bind(user_id)
        .bind(email.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Storage(format!("failed to remember user '{user_id}': {error}"))
        })?;

        Ok(())
    }
}
