use std::collections::BTreeSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use envkeep_application::{
    AuditLogQuery, AuditRepository, MemberRepository, ProjectRepository, RegistryEntryPatch,
    RegistryRepository, SecretRepository, SecretWrite, UserDirectory,
};
use envkeep_core::AppError;
use envkeep_domain::{
    AuditAction, AuditEntryId, AuditLogEntry, EmailAddress, Environment, MemberStatus, Project,
    ProjectMember, SecretKey,
};

use super::InMemoryStore;

fn at(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .unwrap_or_else(|| unreachable!())
        + Duration::seconds(seconds)
}

fn key(value: &str) -> SecretKey {
    SecretKey::new(value).unwrap_or_else(|_| unreachable!())
}

async fn seeded(store: &InMemoryStore, name: &str) -> (Project, Vec<Environment>) {
    let project = Project::new(name, "").unwrap_or_else(|_| unreachable!());
    let environments = Environment::defaults_for(project.id).unwrap_or_else(|_| unreachable!());
    let created = store
        .create_project(project.clone(), environments.clone())
        .await;
    assert!(created.is_ok());
    (project, environments)
}

fn write(environment: &Environment, name: &str, value: &str, seconds: i64) -> SecretWrite {
    SecretWrite {
        project_id: environment.project_id,
        environment_id: environment.id,
        key: key(name),
        value: value.to_owned(),
        actor: "admin@example.com".to_owned(),
        written_at: at(seconds),
    }
}

#[tokio::test]
async fn duplicate_project_slug_is_a_conflict() {
    let store = InMemoryStore::new();
    seeded(&store, "Billing API").await;

    let duplicate = Project::new("billing api", "").unwrap_or_else(|_| unreachable!());
    let result = store.create_project(duplicate, Vec::new()).await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn environments_keep_creation_order() {
    let store = InMemoryStore::new();
    let (project, _) = seeded(&store, "Billing API").await;

    let listed = store
        .list_environments(project.id)
        .await
        .unwrap_or_default();
    let slugs: Vec<&str> = listed.iter().map(|env| env.slug.as_str()).collect();

    assert_eq!(slugs, vec!["development", "staging", "production"]);
}

#[tokio::test]
async fn upsert_bumps_version_and_keeps_identity() {
    let store = InMemoryStore::new();
    let (_, environments) = seeded(&store, "Billing API").await;

    let first = store
        .upsert_secret(write(&environments[0], "API_KEY", "one", 0))
        .await
        .unwrap_or_else(|_| unreachable!());
    let second = store
        .upsert_secret(write(&environments[0], "API_KEY", "one", 5))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(first.id, second.id);
    assert_eq!(first.version, 1);
    assert_eq!(second.version, 2);
    assert_eq!(second.updated_at, at(5));
}

#[tokio::test]
async fn upsert_rejects_environment_from_another_project() {
    let store = InMemoryStore::new();
    let (left, _) = seeded(&store, "Left").await;
    let (_, right_environments) = seeded(&store, "Right").await;

    let mut misplaced = write(&right_environments[0], "API_KEY", "x", 0);
    misplaced.project_id = left.id;

    let result = store.upsert_secret(misplaced).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn registry_watermark_never_moves_backwards() {
    let store = InMemoryStore::new();
    let (project, _) = seeded(&store, "Billing API").await;
    let api_key = key("API_KEY");

    let described = store
        .upsert_entry(
            project.id,
            &api_key,
            RegistryEntryPatch {
                description: Some("Stripe key".to_owned()),
                last_updated_at: None,
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(described.last_updated_at, DateTime::<Utc>::UNIX_EPOCH);

    for seconds in [10, 3] {
        let result = store
            .upsert_entry(
                project.id,
                &api_key,
                RegistryEntryPatch {
                    description: None,
                    last_updated_at: Some(at(seconds)),
                },
            )
            .await;
        assert!(result.is_ok());
    }

    let entry = store
        .find_entry(project.id, &api_key)
        .await
        .unwrap_or_default()
        .unwrap_or_else(|| unreachable!());
    assert_eq!(entry.last_updated_at, at(10));
    assert_eq!(entry.description, "Stripe key");

    let registry = store.list_entries(project.id).await.unwrap_or_default();
    assert_eq!(registry, vec![entry]);
    let audit = store
        .list_audit_entries(AuditLogQuery::for_project(project.id))
        .await
        .unwrap_or_default();
    assert!(audit.is_empty());
}

#[tokio::test]
async fn deleting_environment_cascades_secrets_and_grants() {
    let store = InMemoryStore::new();
    let (project, environments) = seeded(&store, "Billing API").await;
    let staging = environments[1].clone();

    for environment in &environments {
        let result = store
            .upsert_secret(write(environment, "API_KEY", "x", 0))
            .await;
        assert!(result.is_ok());
    }
    let member = ProjectMember::invite(
        project.id,
        EmailAddress::new("dev@example.com").unwrap_or_else(|_| unreachable!()),
        None,
        environments.iter().map(|env| env.id).collect(),
        at(0),
    );
    assert!(store.insert_member(member.clone()).await.is_ok());

    let removed = store.delete_environment(staging.id).await;
    assert_eq!(removed.unwrap_or_default(), 1);

    let remaining = store
        .list_secrets(project.id, None)
        .await
        .unwrap_or_default();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|secret| secret.environment_id != staging.id));

    let updated = store
        .find_member_by_id(member.id)
        .await
        .unwrap_or_default()
        .unwrap_or_else(|| unreachable!());
    assert!(!updated.environments.contains(&staging.id));
    assert_eq!(updated.environments.len(), 2);
}

#[tokio::test]
async fn invites_activate_on_first_sign_in() {
    let store = InMemoryStore::new();
    let (project, _) = seeded(&store, "Billing API").await;
    let email = EmailAddress::new("New.Dev@example.com").unwrap_or_else(|_| unreachable!());

    let invite = ProjectMember::invite(project.id, email.clone(), None, BTreeSet::new(), at(0));
    assert!(store.insert_member(invite.clone()).await.is_ok());

    let duplicate =
        ProjectMember::invite(project.id, email.clone(), None, BTreeSet::new(), at(1));
    assert!(matches!(
        store.insert_member(duplicate).await,
        Err(AppError::Conflict(_))
    ));

    assert_eq!(store.activate_invites(&email, "user-7").await.unwrap_or_default(), 1);
    assert_eq!(store.activate_invites(&email, "user-7").await.unwrap_or_default(), 0);

    let member = store
        .find_member(project.id, "user-7")
        .await
        .unwrap_or_default()
        .unwrap_or_else(|| unreachable!());
    assert_eq!(member.status, MemberStatus::Active);
    assert_eq!(member.id, invite.id);
}

#[tokio::test]
async fn user_directory_resolves_known_emails() {
    let store = InMemoryStore::new();
    let email = EmailAddress::new("ops@example.com").unwrap_or_else(|_| unreachable!());

    assert_eq!(store.find_user_id_by_email(&email).await.unwrap_or_default(), None);
    assert!(store.remember_user("user-1", &email).await.is_ok());
    assert_eq!(
        store.find_user_id_by_email(&email).await.unwrap_or_default(),
        Some("user-1".to_owned())
    );
}

#[tokio::test]
async fn audit_listing_is_newest_first_and_respects_visibility() {
    let store = InMemoryStore::new();
    let (project, environments) = seeded(&store, "Billing API").await;

    let entries = [
        (Some(environments[0].id), 0),
        (Some(environments[2].id), 1),
        (None, 2),
    ];
    for (environment_id, seconds) in entries {
        let appended = store
            .append_entry(AuditLogEntry {
                id: AuditEntryId::new(),
                project_id: project.id,
                environment_id,
                secret_id: None,
                action: AuditAction::SecretUpdate,
                description: format!("entry {seconds}"),
                timestamp: at(seconds),
                performed_by: "admin@example.com".to_owned(),
            })
            .await;
        assert!(appended.is_ok());
    }

    let everything = store
        .list_audit_entries(AuditLogQuery::for_project(project.id))
        .await
        .unwrap_or_default();
    let descriptions: Vec<&str> = everything
        .iter()
        .map(|entry| entry.description.as_str())
        .collect();
    assert_eq!(descriptions, vec!["entry 2", "entry 1", "entry 0"]);

    let mut restricted = AuditLogQuery::for_project(project.id);
    restricted.visible_environment_ids = Some(BTreeSet::from([environments[0].id]));
    let visible = store.list_audit_entries(restricted).await.unwrap_or_default();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].description, "entry 0");
}
