//! Run ledger service
//!
//! Enforces the run state machine on top of the repository's guarded
//! updates: pending -> running -> terminal, with terminal states frozen.

use sqlx::SqlitePool;
use tracing::warn;

use roost_core::domain::run::{Run, RunStatus};
use roost_core::dto::run::RunSummary;

use crate::repository::run_repository;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("run not found: {0}")]
    NotFound(String),
    #[error("run {0} is already in a terminal state")]
    AlreadyCompleted(String),
    #[error("status '{}' is not a terminal run status", .0.as_str())]
    InvalidCompletionStatus(RunStatus),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Records a new pending run for a deployment.
pub async fn create(
    pool: &SqlitePool,
    deployment_id: &str,
    trigger_type: &str,
    trigger_func: &str,
) -> Result<Run, RunError> {
    let run = run_repository::create(pool, deployment_id, trigger_type, trigger_func).await?;
    Ok(run)
}

/// Transitions a pending run to running.
///
/// A run that already left pending is left untouched; the first transition
/// won and this one is logged and dropped.
pub async fn mark_started(pool: &SqlitePool, run_id: &str) -> Result<(), RunError> {
    if run_repository::mark_started(pool, run_id).await? {
        return Ok(());
    }

    match run_repository::find_by_id(pool, run_id).await? {
        Some(run) => {
            warn!(run_id = %run_id, status = %run.status.as_str(), "run already left pending, start ignored");
            Ok(())
        }
        None => Err(RunError::NotFound(run_id.to_string())),
    }
}

/// Finalizes a run with a terminal status and its captured output.
///
/// Exactly one completion takes effect per run; later attempts fail with
/// `AlreadyCompleted`.
pub async fn mark_completed(
    pool: &SqlitePool,
    run_id: &str,
    status: RunStatus,
    exit_code: Option<i32>,
    stdout: &str,
    stderr: &str,
    error_message: Option<&str>,
) -> Result<(), RunError> {
    if !status.is_terminal() {
        return Err(RunError::InvalidCompletionStatus(status));
    }

    let applied =
        run_repository::mark_completed(pool, run_id, status, exit_code, stdout, stderr, error_message)
            .await?;
    if applied {
        return Ok(());
    }

    match run_repository::find_by_id(pool, run_id).await? {
        Some(_) => Err(RunError::AlreadyCompleted(run_id.to_string())),
        None => Err(RunError::NotFound(run_id.to_string())),
    }
}

pub async fn get(pool: &SqlitePool, run_id: &str) -> Result<Run, RunError> {
    run_repository::find_by_id(pool, run_id)
        .await?
        .ok_or_else(|| RunError::NotFound(run_id.to_string()))
}

/// Recent runs for a deployment, newest first.
pub async fn history(
    pool: &SqlitePool,
    deployment_id: &str,
    limit: i64,
) -> Result<Vec<RunSummary>, RunError> {
    let runs = run_repository::list_by_deployment(pool, deployment_id, limit).await?;
    Ok(runs.into_iter().map(RunSummary::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::repository::deployment_repository;
    use roost_core::dto::deployment::CreateDeployment;

    async fn seeded_run(pool: &SqlitePool) -> Run {
        let deployment = deployment_repository::create(
            pool,
            CreateDeployment {
                owner_id: "user_1".to_string(),
                name: "t".to_string(),
                script_text: "def job(): pass".to_string(),
                triggers: vec![],
                integrations: vec![],
            },
        )
        .await
        .unwrap();

        create(pool, &deployment.id, "manual", "job").await.unwrap()
    }

    #[tokio::test]
    async fn test_completion_happens_exactly_once() {
        let pool = test_pool().await;
        let run = seeded_run(&pool).await;

        mark_started(&pool, &run.id).await.unwrap();
        mark_completed(&pool, &run.id, RunStatus::Success, Some(0), "ok", "", None)
            .await
            .unwrap();

        let second = mark_completed(
            &pool,
            &run.id,
            RunStatus::Failed,
            Some(1),
            "",
            "",
            Some("late"),
        )
        .await;
        assert!(matches!(second, Err(RunError::AlreadyCompleted(_))));

        let stored = get(&pool, &run.id).await.unwrap();
        assert_eq!(stored.status, RunStatus::Success);
    }

    #[tokio::test]
    async fn test_completion_rejects_non_terminal_status() {
        let pool = test_pool().await;
        let run = seeded_run(&pool).await;

        let result =
            mark_completed(&pool, &run.id, RunStatus::Running, None, "", "", None).await;
        assert!(matches!(result, Err(RunError::InvalidCompletionStatus(_))));
    }

    #[tokio::test]
    async fn test_mark_started_twice_is_tolerated() {
        let pool = test_pool().await;
        let run = seeded_run(&pool).await;

        mark_started(&pool, &run.id).await.unwrap();
        // Second start is a no-op, not an error.
        mark_started(&pool, &run.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_run_is_reported() {
        let pool = test_pool().await;

        let result = mark_started(&pool, "run_0000000000000000").await;
        assert!(matches!(result, Err(RunError::NotFound(_))));

        let result = get(&pool, "run_0000000000000000").await;
        assert!(matches!(result, Err(RunError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_history_returns_summaries() {
        let pool = test_pool().await;
        let run = seeded_run(&pool).await;

        let history = history(&pool, &run.deployment_id, 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].run_id, run.id);
        assert_eq!(history[0].status, RunStatus::Pending);
    }
}
