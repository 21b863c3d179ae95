use std::collections::BTreeSet;

use chrono::Utc;
use envkeep_application::{MemberRepository, ProjectRepository, SecretRepository, SecretWrite};
use envkeep_core::AppError;
use envkeep_domain::{EmailAddress, Environment, Project, ProjectMember, SecretKey};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresProjectRepository;
use crate::{PostgresMemberRepository, PostgresSecretRepository};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres project tests: {error}");
    }

    Some(pool)
}

fn unique_project(prefix: &str) -> Project {
    let name = format!("{prefix} {}", uuid::Uuid::new_v4().simple());
    Project::new(name, "").unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn create_project_persists_default_environments_in_order() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresProjectRepository::new(pool);
    let project = unique_project("Ordering");
    let environments = Environment::defaults_for(project.id).unwrap_or_else(|_| unreachable!());

    let created = repository
        .create_project(project.clone(), environments)
        .await;
    assert!(created.is_ok());

    let found = repository
        .find_project_by_slug(project.slug.as_str())
        .await
        .unwrap_or_default();
    assert_eq!(found.map(|stored| stored.id), Some(project.id));

    let listed = repository
        .list_environments(project.id)
        .await
        .unwrap_or_default();
    let slugs: Vec<&str> = listed.iter().map(|env| env.slug.as_str()).collect();
    assert_eq!(slugs, vec!["development", "staging", "production"]);
    assert!(listed[2].is_production);
}

#[tokio::test]
async fn duplicate_slug_is_reported_as_conflict() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresProjectRepository::new(pool);
    let project = unique_project("Conflict");
    assert!(repository.create_project(project.clone(), Vec::new()).await.is_ok());

    let mut duplicate = unique_project("Conflict");
    duplicate.slug = project.slug.clone();
    let result = repository.create_project(duplicate, Vec::new()).await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn delete_environment_removes_secrets_and_member_grants() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let projects = PostgresProjectRepository::new(pool.clone());
    let secrets = PostgresSecretRepository::new(pool.clone());
    let members = PostgresMemberRepository::new(pool);

    let project = unique_project("Cascade");
    let environments = Environment::defaults_for(project.id).unwrap_or_else(|_| unreachable!());
    assert!(
        projects
            .create_project(project.clone(), environments.clone())
            .await
            .is_ok()
    );

    for environment in &environments {
        let written = secrets
            .upsert_secret(SecretWrite {
                project_id: project.id,
                environment_id: environment.id,
                key: SecretKey::new("DATABASE_URL").unwrap_or_else(|_| unreachable!()),
                value: "postgres://localhost".to_owned(),
                actor: "admin@example.com".to_owned(),
                written_at: Utc::now(),
            })
            .await;
        assert!(written.is_ok());
    }

    let member = ProjectMember::invite(
        project.id,
        EmailAddress::new(format!("{}@example.com", project.slug))
            .unwrap_or_else(|_| unreachable!()),
        None,
        environments.iter().map(|env| env.id).collect::<BTreeSet<_>>(),
        Utc::now(),
    );
    assert!(members.insert_member(member.clone()).await.is_ok());

    let staging = environments[1].id;
    assert_eq!(projects.delete_environment(staging).await.unwrap_or_default(), 1);

    let remaining = secrets
        .list_secrets(project.id, None)
        .await
        .unwrap_or_default();
    assert_eq!(remaining.len(), 2);

    let member = members
        .find_member_by_id(member.id)
        .await
        .unwrap_or_default()
        .unwrap_or_else(|| unreachable!());
    assert!(!member.environments.contains(&staging));

    let missing = projects.delete_environment(staging).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}
