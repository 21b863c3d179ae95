use chrono::{DateTime, Duration, Utc};
use envkeep_application::{
    ProjectRepository, RegistryEntryPatch, RegistryRepository, SecretRepository, SecretWrite,
};
use envkeep_core::AppError;
use envkeep_domain::{Environment, Project, SecretKey};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresSecretRepository;
use crate::{PostgresProjectRepository, PostgresRegistryRepository};

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
        panic!("failed to run migrations for postgres secret tests: {error}");
    }

    Some(pool)
}

async fn seed_project(pool: &PgPool) -> (Project, Vec<Environment>) {
    let project = Project::new(format!("Secrets {}", uuid::Uuid::new_v4().simple()), "")
        .unwrap_or_else(|_| unreachable!());
    let environments = Environment::defaults_for(project.id).unwrap_or_else(|_| unreachable!());

    let created = PostgresProjectRepository::new(pool.clone())
        .create_project(project.clone(), environments.clone())
        .await;
    assert!(created.is_ok());

    (project, environments)
}

// Postgres stores microseconds; truncate so round-tripped timestamps compare equal.
fn now_micros() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

#[tokio::test]
async fn upsert_increments_version_on_every_write() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let (project, environments) = seed_project(&pool).await;
    let repository = PostgresSecretRepository::new(pool);
    let written_at = now_micros();
    let write = SecretWrite {
        project_id: project.id,
        environment_id: environments[0].id,
        key: SecretKey::new("API_KEY").unwrap_or_else(|_| unreachable!()),
        value: "same".to_owned(),
        actor: "admin@example.com".to_owned(),
        written_at,
    };

    let first = repository
        .upsert_secret(write.clone())
        .await
        .unwrap_or_else(|_| unreachable!());
    let second = repository
        .upsert_secret(SecretWrite {
            written_at: written_at + Duration::seconds(1),
            ..write
        })
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(first.id, second.id);
    assert_eq!(first.version, 1);
    assert_eq!(second.version, 2);
    assert_eq!(second.updated_at, written_at + Duration::seconds(1));
}

#[tokio::test]
async fn upsert_into_foreign_environment_is_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let (left, _) = seed_project(&pool).await;
    let (_, right_environments) = seed_project(&pool).await;
    let repository = PostgresSecretRepository::new(pool);

    let result = repository
        .upsert_secret(SecretWrite {
            project_id: left.id,
            environment_id: right_environments[0].id,
            key: SecretKey::new("API_KEY").unwrap_or_else(|_| unreachable!()),
            value: "x".to_owned(),
            actor: "admin@example.com".to_owned(),
            written_at: now_micros(),
        })
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn registry_upsert_keeps_description_and_latest_watermark() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let (project, _) = seed_project(&pool).await;
    let registry = PostgresRegistryRepository::new(pool);
    let key = SecretKey::new("STRIPE_KEY").unwrap_or_else(|_| unreachable!());
    let later = now_micros();

    let described = registry
        .upsert_entry(
            project.id,
            &key,
            RegistryEntryPatch {
                description: Some("Payments".to_owned()),
                last_updated_at: None,
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(described.last_updated_at, DateTime::<Utc>::UNIX_EPOCH);

    for written_at in [later, later - Duration::minutes(5)] {
        let result = registry
            .upsert_entry(
                project.id,
                &key,
                RegistryEntryPatch {
                    description: None,
                    last_updated_at: Some(written_at),
                },
            )
            .await;
        assert!(result.is_ok());
    }

    let entries = registry.list_entries(project.id).await.unwrap_or_default();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].description, "Payments");
    assert_eq!(entries[0].last_updated_at, later);
}
