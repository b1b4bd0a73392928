//! Deployment Repository
//!
//! Handles all database operations related to deployments. Deployments are
//! never physically removed; deletion is a terminal status transition.

use roost_core::domain::deployment::{Deployment, DeploymentStatus, Trigger};
use roost_core::dto::deployment::CreateDeployment;
use roost_core::id::{DEPLOYMENT_PREFIX, generate_id};
use sqlx::SqlitePool;
use sqlx::types::Json;

/// Create a new deployment in the database with status `active` and
/// version 1.
pub async fn create(pool: &SqlitePool, req: CreateDeployment) -> Result<Deployment, sqlx::Error> {
    let id = generate_id(DEPLOYMENT_PREFIX);
    let now = chrono::Utc::now();

    let deployment = Deployment {
        id: id.clone(),
        owner_id: req.owner_id,
        name: req.name,
        script_text: req.script_text,
        status: DeploymentStatus::Active,
        triggers: req.triggers,
        integrations: req.integrations,
        created_at: now,
        updated_at: now,
        version: 1,
    };

    sqlx::query(
        r#"
        INSERT INTO deployments
            (id, owner_id, name, script_text, status, triggers, integrations,
             created_at, updated_at, version)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&deployment.id)
    .bind(&deployment.owner_id)
    .bind(&deployment.name)
    .bind(&deployment.script_text)
    .bind(deployment.status.as_str())
    .bind(Json(&deployment.triggers))
    .bind(Json(&deployment.integrations))
    .bind(deployment.created_at)
    .bind(deployment.updated_at)
    .bind(deployment.version)
    .execute(pool)
    .await?;

    Ok(deployment)
}

/// Find a deployment by ID
pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Deployment>, sqlx::Error> {
    let row = sqlx::query_as::<_, DeploymentRow>(
        r#"
        SELECT id, owner_id, name, script_text, status, triggers, integrations,
               created_at, updated_at, version
        FROM deployments
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Find all non-deleted deployments for an owner, most recent first
pub async fn list_by_owner(
    pool: &SqlitePool,
    owner_id: &str,
) -> Result<Vec<Deployment>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DeploymentRow>(
        r#"
        SELECT id, owner_id, name, script_text, status, triggers, integrations,
               created_at, updated_at, version
        FROM deployments
        WHERE owner_id = ?1 AND status != 'deleted'
        ORDER BY created_at DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Find all active deployments (used to rebuild scheduler state on startup)
pub async fn list_active(pool: &SqlitePool) -> Result<Vec<Deployment>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DeploymentRow>(
        r#"
        SELECT id, owner_id, name, script_text, status, triggers, integrations,
               created_at, updated_at, version
        FROM deployments
        WHERE status = 'active'
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Update a deployment's status and `updated_at`.
///
/// No-op on an unknown id. `deleted` is terminal: the predicate refuses to
/// transition a deleted deployment anywhere, including back to life.
pub async fn update_status(
    pool: &SqlitePool,
    id: &str,
    status: DeploymentStatus,
) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now();

    sqlx::query(
        r#"
        UPDATE deployments
        SET status = ?1, updated_at = ?2
        WHERE id = ?3 AND status != 'deleted'
        "#,
    )
    .bind(status.as_str())
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Soft-delete a deployment
pub async fn soft_delete(pool: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
    update_status(pool, id, DeploymentStatus::Deleted).await
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct DeploymentRow {
    id: String,
    owner_id: String,
    name: String,
    script_text: String,
    status: String,
    triggers: Json<Vec<Trigger>>,
    integrations: Json<Vec<String>>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    version: i64,
}

impl From<DeploymentRow> for Deployment {
    fn from(row: DeploymentRow) -> Self {
        let status = DeploymentStatus::parse_str(&row.status).unwrap_or(DeploymentStatus::Error);

        Deployment {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            script_text: row.script_text,
            status,
            triggers: row.triggers.0,
            integrations: row.integrations.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use roost_core::domain::deployment::{ScheduleConfig, TriggerConfig};

    fn create_request(owner_id: &str, name: &str) -> CreateDeployment {
        CreateDeployment {
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            script_text: "def job():\n    return \"ok\"\n".to_string(),
            triggers: vec![Trigger {
                func: "job".to_string(),
                config: TriggerConfig::Schedule(ScheduleConfig {
                    cron: "0 9 * * *".to_string(),
                    timezone: "UTC".to_string(),
                }),
            }],
            integrations: vec!["slack".to_string()],
        }
    }

    #[tokio::test]
    async fn test_create_and_find_round_trip() {
        let pool = test_pool().await;

        let created = create(&pool, create_request("user_1", "report"))
            .await
            .unwrap();
        assert!(created.id.starts_with("dep_"));
        assert_eq!(created.status, DeploymentStatus::Active);
        assert_eq!(created.version, 1);

        let found = find_by_id(&pool, &created.id).await.unwrap().unwrap();
        assert_eq!(found.name, "report");
        assert_eq!(found.triggers, created.triggers);
        assert_eq!(found.integrations, vec!["slack".to_string()]);
    }

    #[tokio::test]
    async fn test_find_unknown_id() {
        let pool = test_pool().await;
        let found = find_by_id(&pool, "dep_ffffffffffffffff").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_by_owner_excludes_deleted_newest_first() {
        let pool = test_pool().await;

        let first = create(&pool, create_request("user_1", "first"))
            .await
            .unwrap();
        let second = create(&pool, create_request("user_1", "second"))
            .await
            .unwrap();
        let removed = create(&pool, create_request("user_1", "removed"))
            .await
            .unwrap();
        create(&pool, create_request("user_2", "other"))
            .await
            .unwrap();

        soft_delete(&pool, &removed.id).await.unwrap();

        let listed = list_by_owner(&pool, "user_1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_list_active_only() {
        let pool = test_pool().await;

        let active = create(&pool, create_request("user_1", "active"))
            .await
            .unwrap();
        let paused = create(&pool, create_request("user_1", "paused"))
            .await
            .unwrap();
        update_status(&pool, &paused.id, DeploymentStatus::Paused)
            .await
            .unwrap();

        let listed = list_active(&pool).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, active.id);
    }

    #[tokio::test]
    async fn test_update_status_unknown_id_is_noop() {
        let pool = test_pool().await;
        // Must not error on a missing record.
        update_status(&pool, "dep_ffffffffffffffff", DeploymentStatus::Paused)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_deleted_is_terminal() {
        let pool = test_pool().await;

        let deployment = create(&pool, create_request("user_1", "doomed"))
            .await
            .unwrap();
        soft_delete(&pool, &deployment.id).await.unwrap();

        update_status(&pool, &deployment.id, DeploymentStatus::Active)
            .await
            .unwrap();

        let found = find_by_id(&pool, &deployment.id).await.unwrap().unwrap();
        assert_eq!(found.status, DeploymentStatus::Deleted);
    }
}
