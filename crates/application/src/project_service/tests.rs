use envkeep_core::AppError;
use envkeep_domain::{AuditAction, SyncStatus};

use crate::CreateEnvironmentInput;
use crate::test_support::{Fixture, admin, developer};

#[tokio::test]
async fn new_project_gets_three_default_environments() {
    let fixture = Fixture::new();

    let view = fixture
        .projects
        .create_project(&admin(), "Growth Platform", "marketing site")
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(view.project.slug.as_str(), "growth-platform");
    let slugs: Vec<&str> = view
        .environments
        .iter()
        .map(|environment| environment.slug.as_str())
        .collect();
    assert_eq!(slugs, vec!["development", "staging", "production"]);
    assert!(view.environments[2].is_production);

    let duplicate = fixture
        .projects
        .create_project(&admin(), "growth platform", "")
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn project_creation_requires_admin() {
    let fixture = Fixture::new();

    let result = fixture
        .projects
        .create_project(&developer(), "Shadow", "")
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn non_member_sees_project_without_environments() {
    let fixture = Fixture::new();
    let (project, _) = fixture.seed_project("Billing").await;

    let result = fixture
        .projects
        .project_by_slug(&developer(), project.slug.as_str())
        .await;
    assert!(matches!(
        result,
        Ok(view) if view.project.id == project.id && view.environments.is_empty()
    ));

    let missing = fixture.projects.project_by_slug(&developer(), "unknown").await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn environment_slugs_are_unique_and_parents_must_be_local() {
    let fixture = Fixture::new();
    let (project, environments) = fixture.seed_project("Billing").await;
    let (other, other_environments) = fixture.seed_project("Other").await;

    let preview = fixture
        .projects
        .create_environment(
            &admin(),
            project.id,
            CreateEnvironmentInput {
                name: "Preview".to_owned(),
                slug: None,
                is_production: false,
                parent_id: Some(environments[1].id),
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(preview.slug.as_str(), "preview");

    let duplicate = fixture
        .projects
        .create_environment(
            &admin(),
            project.id,
            CreateEnvironmentInput {
                name: "Staging two".to_owned(),
                slug: Some("staging".to_owned()),
                is_production: false,
                parent_id: None,
            },
        )
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let foreign_parent = fixture
        .projects
        .create_environment(
            &admin(),
            other.id,
            CreateEnvironmentInput {
                name: "QA".to_owned(),
                slug: None,
                is_production: false,
                parent_id: Some(environments[0].id),
            },
        )
        .await;
    assert!(matches!(foreign_parent, Err(AppError::Validation(_))));
    assert_eq!(other_environments.len(), 3);
}

#[tokio::test]
async fn deleting_an_environment_removes_its_secrets_only() {
    let fixture = Fixture::new();
    let (project, environments) = fixture.seed_project("Billing").await;
    for environment in &environments {
        assert!(
            fixture
                .secrets
                .save_secret(&admin(), project.id, environment.id, "API_KEY", "v")
                .await
                .is_ok()
        );
    }

    let deleted = fixture
        .projects
        .delete_environment(&admin(), environments[1].id)
        .await;
    assert!(deleted.is_ok());

    let secrets = fixture
        .secrets
        .list_secrets(&admin(), project.id, None)
        .await
        .unwrap_or_default();
    assert_eq!(secrets.len(), 2);

    let records = fixture
        .sync
        .evaluate(&admin(), project.id)
        .await
        .unwrap_or_default();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].status, SyncStatus::Synced);

    let entries = fixture.store.audit_entries().await;
    assert!(
        entries
            .iter()
            .any(|entry| entry.action == AuditAction::EnvironmentDelete)
    );
}

#[tokio::test]
async fn audit_log_follows_environment_visibility() {
    let fixture = Fixture::new();
    let (project, environments) = fixture.seed_project("Billing").await;
    fixture.store.register_user("dev-1", "dev@example.com").await;
    assert!(
        fixture
            .members
            .add_member(
                &admin(),
                project.id,
                "dev@example.com",
                std::collections::BTreeSet::from([environments[0].id]),
            )
            .await
            .is_ok()
    );
    for environment in &environments {
        assert!(
            fixture
                .secrets
                .save_secret(&admin(), project.id, environment.id, "API_KEY", "v")
                .await
                .is_ok()
        );
    }

    let admin_view = fixture
        .audit
        .list_audit_log(&admin(), project.id, None, 50, 0)
        .await
        .unwrap_or_default();
    assert_eq!(admin_view.len(), 5);
    assert_eq!(admin_view[0].action, AuditAction::SecretUpdate);
    assert_eq!(admin_view[4].action, AuditAction::ProjectCreate);

    let developer_view = fixture
        .audit
        .list_audit_log(&developer(), project.id, None, 50, 0)
        .await
        .unwrap_or_default();
    assert_eq!(developer_view.len(), 1);
    assert_eq!(developer_view[0].environment_id, Some(environments[0].id));

    let hidden = fixture
        .audit
        .list_audit_log(&developer(), project.id, Some(environments[2].id), 50, 0)
        .await;
    assert!(matches!(hidden, Err(AppError::Forbidden(_))));
}
