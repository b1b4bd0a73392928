//! Deployment lifecycle service
//!
//! Owns the deployment state machine and keeps the scheduler's job set in
//! sync with it: active deployments have live schedule jobs, everything
//! else has none.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::info;

use roost_core::domain::deployment::{Deployment, DeploymentStatus, TriggerConfig};
use roost_core::dto::deployment::{CreateDeployment, DeploymentReceipt, DeploymentSummary};

use crate::repository::{deployment_repository, run_repository};
use crate::scheduler::cron::{parse_timezone, validate_expression};
use crate::scheduler::TriggerScheduler;

#[derive(Debug, thiserror::Error)]
pub enum DeploymentError {
    #[error("deployment not found: {0}")]
    NotFound(String),
    #[error("deployment {0} has been deleted")]
    Deleted(String),
    #[error("invalid trigger '{func}': {message}")]
    InvalidTrigger { func: String, message: String },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct DeploymentService {
    pool: SqlitePool,
    scheduler: Arc<TriggerScheduler>,
}

impl DeploymentService {
    pub fn new(pool: SqlitePool, scheduler: Arc<TriggerScheduler>) -> Self {
        Self { pool, scheduler }
    }

    /// Creates a deployment and registers its schedule triggers.
    ///
    /// Schedule triggers are validated before anything is persisted, so a
    /// bad cron expression or timezone rejects the whole request instead of
    /// leaving a half-registered deployment behind.
    pub async fn create(
        &self,
        req: CreateDeployment,
    ) -> Result<DeploymentReceipt, DeploymentError> {
        for trigger in &req.triggers {
            let TriggerConfig::Schedule(config) = &trigger.config else {
                continue;
            };
            validate_expression(&config.cron).map_err(|e| DeploymentError::InvalidTrigger {
                func: trigger.func.clone(),
                message: e.to_string(),
            })?;
            parse_timezone(&config.timezone).map_err(|e| DeploymentError::InvalidTrigger {
                func: trigger.func.clone(),
                message: e.to_string(),
            })?;
        }

        let deployment = deployment_repository::create(&self.pool, req).await?;
        let registered = self.scheduler.register(&deployment);

        info!(
            deployment_id = %deployment.id,
            owner_id = %deployment.owner_id,
            triggers_registered = registered,
            "deployment created"
        );

        Ok(self.receipt(&deployment, registered))
    }

    pub async fn get(&self, id: &str) -> Result<Deployment, DeploymentError> {
        let deployment = deployment_repository::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| DeploymentError::NotFound(id.to_string()))?;
        if deployment.status == DeploymentStatus::Deleted {
            return Err(DeploymentError::Deleted(id.to_string()));
        }
        Ok(deployment)
    }

    /// Pauses a deployment: jobs come off the scheduler first so nothing
    /// can fire between the two steps.
    pub async fn pause(&self, id: &str) -> Result<(), DeploymentError> {
        let deployment = self.get(id).await?;

        self.scheduler.unregister(&deployment.id);
        deployment_repository::update_status(&self.pool, id, DeploymentStatus::Paused).await?;

        info!(deployment_id = %id, "deployment paused");
        Ok(())
    }

    /// Resumes a paused deployment and re-registers its schedule triggers.
    pub async fn resume(&self, id: &str) -> Result<DeploymentReceipt, DeploymentError> {
        let mut deployment = self.get(id).await?;

        deployment_repository::update_status(&self.pool, id, DeploymentStatus::Active).await?;
        deployment.status = DeploymentStatus::Active;
        let registered = self.scheduler.register(&deployment);

        info!(deployment_id = %id, triggers_registered = registered, "deployment resumed");
        Ok(self.receipt(&deployment, registered))
    }

    /// Soft-deletes a deployment. The record stays, and its run history with
    /// it, but the deployment is terminal and disappears from listings.
    pub async fn remove(&self, id: &str) -> Result<(), DeploymentError> {
        let deployment = self.get(id).await?;

        self.scheduler.unregister(&deployment.id);
        deployment_repository::soft_delete(&self.pool, id).await?;

        info!(deployment_id = %id, "deployment deleted");
        Ok(())
    }

    /// Rebuilds the scheduler's job set from the active deployments.
    ///
    /// Called once at startup; the job set is never persisted.
    pub async fn restore_schedules(&self) -> Result<usize, DeploymentError> {
        let deployments = deployment_repository::list_active(&self.pool).await?;

        let mut restored = 0;
        for deployment in &deployments {
            restored += self.scheduler.register(deployment);
        }

        info!(
            deployments = deployments.len(),
            triggers_registered = restored,
            "schedules restored"
        );
        Ok(restored)
    }

    /// Listing view for one owner, with last-run and next-fire times filled
    /// in. Deleted deployments are excluded by the repository.
    pub async fn summaries_by_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<DeploymentSummary>, DeploymentError> {
        let deployments = deployment_repository::list_by_owner(&self.pool, owner_id).await?;

        let mut summaries = Vec::with_capacity(deployments.len());
        for deployment in deployments {
            let id = deployment.id.clone();
            let mut summary = DeploymentSummary::from(deployment);
            summary.last_run = run_repository::last_run(&self.pool, &id)
                .await?
                .and_then(|run| run.completed_at.or(run.started_at));
            summary.next_run = self.scheduler.next_fire_time(&id);
            summaries.push(summary);
        }

        Ok(summaries)
    }

    fn receipt(&self, deployment: &Deployment, registered: usize) -> DeploymentReceipt {
        DeploymentReceipt {
            deployment_id: deployment.id.clone(),
            status: deployment.status,
            triggers_registered: registered,
            created_at: deployment.created_at,
            next_run: self.scheduler.next_fire_time(&deployment.id),
        }
    }
}
