//! Run Repository
//!
//! Handles all database operations related to runs. Run records are the
//! durable execution ledger: created pending, updated at start and
//! completion, never deleted.

use roost_core::domain::run::{Run, RunStatus};
use roost_core::id::{RUN_PREFIX, generate_id};
use sqlx::SqlitePool;

/// Create a new run record with status `pending`
pub async fn create(
    pool: &SqlitePool,
    deployment_id: &str,
    trigger_type: &str,
    trigger_func: &str,
) -> Result<Run, sqlx::Error> {
    let id = generate_id(RUN_PREFIX);

    let run = Run {
        id: id.clone(),
        deployment_id: deployment_id.to_string(),
        trigger_type: trigger_type.to_string(),
        trigger_func: trigger_func.to_string(),
        status: RunStatus::Pending,
        started_at: None,
        completed_at: None,
        duration_ms: None,
        exit_code: None,
        stdout: String::new(),
        stderr: String::new(),
        error_message: None,
    };

    sqlx::query(
        r#"
        INSERT INTO runs (id, deployment_id, trigger_type, trigger_func, status)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&run.id)
    .bind(&run.deployment_id)
    .bind(&run.trigger_type)
    .bind(&run.trigger_func)
    .bind(run.status.as_str())
    .execute(pool)
    .await?;

    Ok(run)
}

/// Mark a pending run as running and stamp `started_at`.
///
/// Returns whether the update applied; a run that already left `pending` is
/// untouched.
pub async fn mark_started(pool: &SqlitePool, run_id: &str) -> Result<bool, sqlx::Error> {
    let now = chrono::Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE runs
        SET status = 'running', started_at = ?1
        WHERE id = ?2 AND status = 'pending'
        "#,
    )
    .bind(now)
    .bind(run_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Finalize a run with a terminal status and its captured output.
///
/// Returns whether the update applied. The predicate refuses to touch a run
/// already in a terminal state, so the first completion wins and the audit
/// record is never overwritten.
pub async fn mark_completed(
    pool: &SqlitePool,
    run_id: &str,
    status: RunStatus,
    exit_code: Option<i32>,
    stdout: &str,
    stderr: &str,
    error_message: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let now = chrono::Utc::now();

    // duration_ms is derived from started_at, which stays null for runs that
    // were finalized before ever starting.
    let started_at: Option<Option<chrono::DateTime<chrono::Utc>>> =
        sqlx::query_scalar("SELECT started_at FROM runs WHERE id = ?1")
            .bind(run_id)
            .fetch_optional(pool)
            .await?;

    let duration_ms = started_at
        .flatten()
        .map(|started| (now - started).num_milliseconds());

    let result = sqlx::query(
        r#"
        UPDATE runs
        SET status = ?1, completed_at = ?2, duration_ms = ?3, exit_code = ?4,
            stdout = ?5, stderr = ?6, error_message = ?7
        WHERE id = ?8 AND status IN ('pending', 'running')
        "#,
    )
    .bind(status.as_str())
    .bind(now)
    .bind(duration_ms)
    .bind(exit_code)
    .bind(stdout)
    .bind(stderr)
    .bind(error_message)
    .bind(run_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Find a run by ID
pub async fn find_by_id(pool: &SqlitePool, run_id: &str) -> Result<Option<Run>, sqlx::Error> {
    let row = sqlx::query_as::<_, RunRow>(
        r#"
        SELECT id, deployment_id, trigger_type, trigger_func, status,
               started_at, completed_at, duration_ms, exit_code, stdout,
               stderr, error_message
        FROM runs
        WHERE id = ?1
        "#,
    )
    .bind(run_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Find runs for a deployment, most recent first
pub async fn list_by_deployment(
    pool: &SqlitePool,
    deployment_id: &str,
    limit: i64,
) -> Result<Vec<Run>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RunRow>(
        r#"
        SELECT id, deployment_id, trigger_type, trigger_func, status,
               started_at, completed_at, duration_ms, exit_code, stdout,
               stderr, error_message
        FROM runs
        WHERE deployment_id = ?1
        ORDER BY started_at DESC
        LIMIT ?2
        "#,
    )
    .bind(deployment_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Find the most recent run for a deployment
pub async fn last_run(pool: &SqlitePool, deployment_id: &str) -> Result<Option<Run>, sqlx::Error> {
    let runs = list_by_deployment(pool, deployment_id, 1).await?;
    Ok(runs.into_iter().next())
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct RunRow {
    id: String,
    deployment_id: String,
    trigger_type: String,
    trigger_func: String,
    status: String,
    started_at: Option<chrono::DateTime<chrono::Utc>>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
    duration_ms: Option<i64>,
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
    error_message: Option<String>,
}

impl From<RunRow> for Run {
    fn from(row: RunRow) -> Self {
        let status = RunStatus::parse_str(&row.status).unwrap_or(RunStatus::Failed);

        Run {
            id: row.id,
            deployment_id: row.deployment_id,
            trigger_type: row.trigger_type,
            trigger_func: row.trigger_func,
            status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            duration_ms: row.duration_ms,
            exit_code: row.exit_code,
            stdout: row.stdout,
            stderr: row.stderr,
            error_message: row.error_message,
        }
    }
}
