//! Deployment DTOs

use serde::{Deserialize, Serialize};

use crate::domain::deployment::{Deployment, DeploymentStatus, Trigger};

/// Request to create a new deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeployment {
    pub owner_id: String,
    pub name: String,
    pub script_text: String,
    pub triggers: Vec<Trigger>,
    pub integrations: Vec<String>,
}

/// Lightweight deployment summary for listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentSummary {
    pub id: String,
    pub name: String,
    pub status: DeploymentStatus,
    pub trigger_count: usize,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_run: Option<chrono::DateTime<chrono::Utc>>,
    pub next_run: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<Deployment> for DeploymentSummary {
    fn from(deployment: Deployment) -> Self {
        Self {
            id: deployment.id,
            name: deployment.name,
            status: deployment.status,
            trigger_count: deployment.triggers.len(),
            created_at: deployment.created_at,
            last_run: None,
            next_run: None,
        }
    }
}

/// Confirmation returned after creating or resuming a deployment.
///
/// `triggers_registered` reports how many schedule triggers actually made it
/// into the live job set, so a partially registered deployment is visible to
/// its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentReceipt {
    pub deployment_id: String,
    pub status: DeploymentStatus,
    pub triggers_registered: usize,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub next_run: Option<chrono::DateTime<chrono::Utc>>,
}
