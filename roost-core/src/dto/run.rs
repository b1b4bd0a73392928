//! Run DTOs

use serde::{Deserialize, Serialize};

use crate::domain::run::{Run, RunStatus};

/// Run summary for listing and status displays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub deployment_id: String,
    pub trigger_type: String,
    pub trigger_func: String,
    pub status: RunStatus,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub duration_ms: Option<i64>,
}

impl From<Run> for RunSummary {
    fn from(run: Run) -> Self {
        Self {
            run_id: run.id,
            deployment_id: run.deployment_id,
            trigger_type: run.trigger_type,
            trigger_func: run.trigger_func,
            status: run.status,
            started_at: run.started_at,
            completed_at: run.completed_at,
            duration_ms: run.duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_summary_conversion() {
        let run = Run {
            id: "run_aabbccddeeff0011".to_string(),
            deployment_id: "dep_0011223344556677".to_string(),
            trigger_type: "schedule".to_string(),
            trigger_func: "job".to_string(),
            status: RunStatus::Success,
            started_at: Some(chrono::Utc::now()),
            completed_at: Some(chrono::Utc::now()),
            duration_ms: Some(125),
            exit_code: Some(0),
            stdout: "ok".to_string(),
            stderr: String::new(),
            error_message: None,
        };

        let summary: RunSummary = run.clone().into();
        assert_eq!(summary.run_id, run.id);
        assert_eq!(summary.status, RunStatus::Success);
        assert_eq!(summary.duration_ms, Some(125));
    }
}
