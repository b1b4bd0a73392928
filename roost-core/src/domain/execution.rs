//! Execution result types
//!
//! Returned by the engine after executing one script function. Script-level
//! failures (non-zero exit, timeout, launch failure) are all modeled as
//! structured outcomes here, never as errors propagated to the caller.

use serde::{Deserialize, Serialize};

use crate::domain::run::RunStatus;

/// Outcome category of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Failed,
    Timeout,
}

impl From<ExecutionStatus> for RunStatus {
    fn from(status: ExecutionStatus) -> Self {
        match status {
            ExecutionStatus::Success => RunStatus::Success,
            ExecutionStatus::Failed => RunStatus::Failed,
            ExecutionStatus::Timeout => RunStatus::Timeout,
        }
    }
}

/// Result of executing one script function in an isolated process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub error_message: Option<String>,
}

impl ExecutionResult {
    pub fn success(exit_code: i32, stdout: String, stderr: String) -> Self {
        Self {
            status: ExecutionStatus::Success,
            exit_code: Some(exit_code),
            stdout,
            stderr,
            error_message: None,
        }
    }

    pub fn failed(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        error_message: String,
    ) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            exit_code,
            stdout,
            stderr,
            error_message: Some(error_message),
        }
    }

    pub fn timeout(timeout_seconds: u64, stdout: String, stderr: String) -> Self {
        Self {
            status: ExecutionStatus::Timeout,
            exit_code: None,
            stdout,
            stderr,
            error_message: Some(format!(
                "Execution timed out after {} seconds",
                timeout_seconds
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_maps_to_run_status() {
        assert_eq!(RunStatus::from(ExecutionStatus::Success), RunStatus::Success);
        assert_eq!(RunStatus::from(ExecutionStatus::Failed), RunStatus::Failed);
        assert_eq!(RunStatus::from(ExecutionStatus::Timeout), RunStatus::Timeout);
    }

    #[test]
    fn test_timeout_result_message() {
        let result = ExecutionResult::timeout(30, String::new(), String::new());
        assert_eq!(result.status, ExecutionStatus::Timeout);
        assert_eq!(result.exit_code, None);
        assert!(result.error_message.unwrap().contains("30 seconds"));
    }

    #[test]
    fn test_failed_result_keeps_output() {
        let result = ExecutionResult::failed(
            Some(1),
            "partial".to_string(),
            "boom".to_string(),
            "Script exited with code 1".to_string(),
        );
        assert_eq!(result.exit_code, Some(1));
        assert_eq!(result.stdout, "partial");
        assert_eq!(result.stderr, "boom");
    }
}
