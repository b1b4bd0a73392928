//! Run execution pipeline
//!
//! Bridges a scheduler firing (or a manual trigger) to the engine: record
//! the run, gate on credentials, build the subprocess environment, execute,
//! and finalize the ledger with whatever came back.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{error, info, warn};

use roost_core::domain::deployment::Deployment;
use roost_engine::Executor;

use crate::credentials::CredentialStore;
use crate::repository::deployment_repository;
use crate::scheduler::RunCallback;
use crate::service::run::{self, RunError};
use roost_core::domain::run::RunStatus;

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("deployment not found: {0}")]
    DeploymentNotFound(String),
    #[error(transparent)]
    Run(#[from] RunError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Everything a firing needs to become a finished run.
pub struct RunContext {
    pool: SqlitePool,
    executor: Arc<Executor>,
    credentials: Arc<CredentialStore>,
    base_env: HashMap<String, String>,
}

impl RunContext {
    pub fn new(
        pool: SqlitePool,
        executor: Arc<Executor>,
        credentials: Arc<CredentialStore>,
        base_env: HashMap<String, String>,
    ) -> Self {
        Self {
            pool,
            executor,
            credentials,
            base_env,
        }
    }

    /// The scheduler-facing fire handler backed by this context.
    pub fn callback(self: &Arc<Self>) -> RunCallback {
        let context = Arc::clone(self);
        Arc::new(move |deployment_id, trigger_type, func| {
            let context = Arc::clone(&context);
            Box::pin(async move {
                context.fire(&deployment_id, &trigger_type, &func).await;
            })
        })
    }

    /// Runs the pipeline and logs any error; a failed firing must never
    /// propagate into the scheduler loop.
    pub async fn fire(&self, deployment_id: &str, trigger_type: &str, func: &str) {
        if let Err(e) = self.execute_fired_run(deployment_id, trigger_type, func).await {
            error!(
                deployment_id = %deployment_id,
                func = %func,
                error = %e,
                "run pipeline failed"
            );
        }
    }

    /// Full pipeline for one firing: ledger entry, credential gate,
    /// execution, finalization.
    pub async fn execute_fired_run(
        &self,
        deployment_id: &str,
        trigger_type: &str,
        func: &str,
    ) -> Result<String, ExecutionError> {
        let deployment = deployment_repository::find_by_id(&self.pool, deployment_id)
            .await?
            .ok_or_else(|| ExecutionError::DeploymentNotFound(deployment_id.to_string()))?;

        let run = run::create(&self.pool, deployment_id, trigger_type, func).await?;
        info!(run_id = %run.id, deployment_id = %deployment_id, func = %func, "run created");

        // Every integration the deployment names must be provisioned before
        // the script gets a process.
        if let Some(missing) = self.first_missing_integration(&deployment) {
            let message = format!("Missing credentials for integration '{}'", missing);
            warn!(run_id = %run.id, integration = %missing, "run rejected, credentials missing");
            run::mark_completed(
                &self.pool,
                &run.id,
                RunStatus::Failed,
                None,
                "",
                "",
                Some(&message),
            )
            .await?;
            return Ok(run.id);
        }

        run::mark_started(&self.pool, &run.id).await?;

        let env = self.build_env(&deployment);
        let result = self
            .executor
            .execute(&deployment.script_text, func, &env)
            .await;

        info!(
            run_id = %run.id,
            status = %RunStatus::from(result.status).as_str(),
            exit_code = ?result.exit_code,
            "run finished"
        );

        run::mark_completed(
            &self.pool,
            &run.id,
            result.status.into(),
            result.exit_code,
            &result.stdout,
            &result.stderr,
            result.error_message.as_deref(),
        )
        .await?;

        Ok(run.id)
    }

    fn first_missing_integration(&self, deployment: &Deployment) -> Option<String> {
        deployment
            .integrations
            .iter()
            .find(|integration| {
                !self
                    .credentials
                    .has_credentials(&deployment.owner_id, integration)
            })
            .cloned()
    }

    /// Base environment plus the resolved credentials of every integration
    /// the deployment names. The ambient process environment is never
    /// inherited.
    fn build_env(&self, deployment: &Deployment) -> HashMap<String, String> {
        let mut env = self.base_env.clone();
        env.extend(
            self.credentials
                .resolve_all(&deployment.owner_id, &deployment.integrations),
        );
        env
    }
}
