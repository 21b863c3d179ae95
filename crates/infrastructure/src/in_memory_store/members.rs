use std::collections::BTreeSet;

use async_trait::async_trait;
use envkeep_application::{MemberRepository, UserDirectory};
use envkeep_core::{AppError, AppResult};
use envkeep_domain::{
    EmailAddress, EnvironmentId, MemberId, MemberStatus, ProjectId, ProjectMember,
};

use super::InMemoryStore;

#[async_trait]
impl MemberRepository for InMemoryStore {
    async fn find_member(
        &self,
        project_id: ProjectId,
        user_id: &str,
    ) -> AppResult<Option<ProjectMember>> {
        Ok(self
            .members
            .read()
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
            .read()
            .await
            .iter()
            .find(|member| member.id == member_id)
            .cloned())
    }

    async fn list_members(&self, project_id: ProjectId) -> AppResult<Vec<ProjectMember>> {
        let mut values: Vec<ProjectMember> = self
            .members
            .read()
            .await
            .iter()
            .filter(|member| member.project_id == project_id)
            .cloned()
            .collect();
        values.sort_by(|left, right| left.invited_at.cmp(&right.invited_at));
        Ok(values)
    }

    async fn list_memberships(&self, user_id: &str) -> AppResult<Vec<ProjectMember>> {
        Ok(self
            .members
            .read()
            .await
            .iter()
            .filter(|member| member.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect())
    }

    async fn insert_member(&self, member: ProjectMember) -> AppResult<()> {
        let mut members = self.members.write().await;

        let duplicate = members.iter().any(|existing| {
            existing.project_id == member.project_id
                && (existing.invite_email == member.invite_email
                    || (member.user_id.is_some() && existing.user_id == member.user_id))
        });
        if duplicate {
            return Err(AppError::Conflict(format!(
                "'{}' is already a member of project '{}'",
                member.invite_email, member.project_id
            )));
        }

        members.push(member);
        Ok(())
    }

    async fn update_member_environments(
        &self,
        member_id: MemberId,
        environments: BTreeSet<EnvironmentId>,
    ) -> AppResult<ProjectMember> {
        let mut members = self.members.write().await;
        let member = members
            .iter_mut()
            .find(|member| member.id == member_id)
            .ok_or_else(|| AppError::NotFound(format!("member '{member_id}' does not exist")))?;

        member.environments = environments;
        Ok(member.clone())
    }

    async fn delete_member(&self, member_id: MemberId) -> AppResult<ProjectMember> {
        let mut members = self.members.write().await;
        let index = members
            .iter()
            .position(|member| member.id == member_id)
            .ok_or_else(|| AppError::NotFound(format!("member '{member_id}' does not exist")))?;

        Ok(members.remove(index))
    }

    async fn activate_invites(&self, email: &EmailAddress, user_id: &str) -> AppResult<u64> {
        let mut members = self.members.write().await;
        let joined: BTreeSet<ProjectId> = members
            .iter()
            .filter(|member| member.user_id.as_deref() == Some(user_id))
            .map(|member| member.project_id)
            .collect();
        let mut activated = 0;

        for member in members.iter_mut().filter(|member| {
            member.status == MemberStatus::Invited
                && &member.invite_email == email
                && !joined.contains(&member.project_id)
        }) {
            member.status = MemberStatus::Active;
            member.user_id = Some(user_id.to_owned());
            activated += 1;
        }

        Ok(activated)
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find_user_id_by_email(&self, email: &EmailAddress) -> AppResult<Option<String>> {
        let users = self.users.read().await;

        let mut matches: Vec<&String> = users
            .iter()
            .filter_map(|(user_id, known)| (known == email).then_some(user_id))
            .collect();
        matches.sort();

        Ok(matches.first().map(|user_id| (*user_id).clone()))
    }

    async fn remember_user(&self, user_id: &str, email: &EmailAddress) -> AppResult<()> {
        self.users
            .write()
            .await
            .insert(user_id.to_owned(), email.clone());
        Ok(())
    }
}
