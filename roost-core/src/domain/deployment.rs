//! Deployment domain types

use serde::{Deserialize, Serialize};

/// A deployed script with its trigger and integration declarations.
///
/// Structure shared between the orchestrator (persists) and the scheduler
/// (projects schedule triggers into live jobs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub script_text: String,
    pub status: DeploymentStatus,
    pub triggers: Vec<Trigger>,
    pub integrations: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub version: i64,
}

/// Status of a deployment
///
/// `Deleted` is terminal: a deleted deployment never transitions again and is
/// never physically removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Active,
    Paused,
    Error,
    Deleted,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Active => "active",
            DeploymentStatus::Paused => "paused",
            DeploymentStatus::Error => "error",
            DeploymentStatus::Deleted => "deleted",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(DeploymentStatus::Active),
            "paused" => Some(DeploymentStatus::Paused),
            "error" => Some(DeploymentStatus::Error),
            "deleted" => Some(DeploymentStatus::Deleted),
            _ => None,
        }
    }
}

/// A trigger that names which function to invoke and under what condition.
///
/// Triggers have no independent lifecycle; they live and die with their
/// deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub func: String,
    #[serde(flatten)]
    pub config: TriggerConfig,
}

/// Type-specific trigger configuration.
///
/// Each variant carries only its relevant fields and is matched exhaustively
/// at registration time. Serializes as `{"type": ..., "config": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "snake_case")]
pub enum TriggerConfig {
    Schedule(ScheduleConfig),
    Event(EventConfig),
    Webhook,
    Manual,
}

impl TriggerConfig {
    /// Stable string name of the trigger type, recorded on runs.
    pub fn kind(&self) -> &'static str {
        match self {
            TriggerConfig::Schedule(_) => "schedule",
            TriggerConfig::Event(_) => "event",
            TriggerConfig::Webhook => "webhook",
            TriggerConfig::Manual => "manual",
        }
    }
}

/// Configuration for a schedule trigger: a 5-field cron expression plus an
/// IANA timezone name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub cron: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Configuration for an event trigger: a filter predicate map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventConfig {
    #[serde(default)]
    pub filter: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_serde_shape() {
        let trigger = Trigger {
            func: "job".to_string(),
            config: TriggerConfig::Schedule(ScheduleConfig {
                cron: "0 9 * * *".to_string(),
                timezone: "UTC".to_string(),
            }),
        };

        let value = serde_json::to_value(&trigger).unwrap();
        assert_eq!(value["type"], "schedule");
        assert_eq!(value["func"], "job");
        assert_eq!(value["config"]["cron"], "0 9 * * *");
        assert_eq!(value["config"]["timezone"], "UTC");

        let back: Trigger = serde_json::from_value(value).unwrap();
        assert_eq!(back, trigger);
    }

    #[test]
    fn test_trigger_timezone_defaults_to_utc() {
        let json = serde_json::json!({
            "type": "schedule",
            "func": "job",
            "config": { "cron": "*/5 * * * *" }
        });

        let trigger: Trigger = serde_json::from_value(json).unwrap();
        match trigger.config {
            TriggerConfig::Schedule(cfg) => assert_eq!(cfg.timezone, "UTC"),
            other => panic!("expected schedule config, got {:?}", other),
        }
    }

    #[test]
    fn test_trigger_kind_names() {
        let schedule = TriggerConfig::Schedule(ScheduleConfig {
            cron: "* * * * *".to_string(),
            timezone: "UTC".to_string(),
        });
        assert_eq!(schedule.kind(), "schedule");
        assert_eq!(TriggerConfig::Webhook.kind(), "webhook");
        assert_eq!(TriggerConfig::Manual.kind(), "manual");
    }

    #[test]
    fn test_deployment_status_round_trip() {
        for status in [
            DeploymentStatus::Active,
            DeploymentStatus::Paused,
            DeploymentStatus::Error,
            DeploymentStatus::Deleted,
        ] {
            assert_eq!(DeploymentStatus::parse_str(status.as_str()), Some(status));
        }
        assert_eq!(DeploymentStatus::parse_str("bogus"), None);
    }
}
