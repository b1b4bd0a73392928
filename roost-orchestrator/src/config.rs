//! Orchestrator configuration
//!
//! Defines all configurable parameters for the orchestrator including the
//! database location, execution timeout, interpreter, and scheduler tick
//! interval.

use std::collections::HashMap;
use std::time::Duration;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection string
    pub database_url: String,

    /// Maximum time a script execution can run before being killed
    pub timeout_seconds: u64,

    /// Interpreter used to run deployed scripts
    pub interpreter: String,

    /// How often the scheduler loop checks for due jobs
    pub tick_interval: Duration,

    /// Baseline environment injected into every execution, merged under the
    /// resolved credential bag. Scripts inherit nothing else.
    pub base_env: HashMap<String, String>,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new() -> Self {
        let mut base_env = HashMap::new();
        // PATH keeps the interpreter's own lookups working; everything else
        // stays out of the child environment.
        if let Ok(path) = std::env::var("PATH") {
            base_env.insert("PATH".to_string(), path);
        }

        Self {
            database_url: "sqlite://roost.db".to_string(),
            timeout_seconds: 300,
            interpreter: "python3".to_string(),
            tick_interval: Duration::from_secs(1),
            base_env,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - DATABASE_URL (optional, default: sqlite://roost.db)
    /// - EXECUTION_TIMEOUT (optional, seconds, default: 300)
    /// - SCRIPT_INTERPRETER (optional, default: python3)
    /// - SCHEDULER_TICK_MS (optional, milliseconds, default: 1000)
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::new();

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }

        if let Some(timeout) = std::env::var("EXECUTION_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.timeout_seconds = timeout;
        }

        if let Ok(interpreter) = std::env::var("SCRIPT_INTERPRETER") {
            config.interpreter = interpreter;
        }

        if let Some(tick_ms) = std::env::var("SCHEDULER_TICK_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.tick_interval = Duration::from_millis(tick_ms);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.is_empty() {
            anyhow::bail!("database_url cannot be empty");
        }

        if self.timeout_seconds == 0 {
            anyhow::bail!("timeout_seconds must be greater than 0");
        }

        if self.interpreter.is_empty() {
            anyhow::bail!("interpreter cannot be empty");
        }

        if self.tick_interval.is_zero() {
            anyhow::bail!("tick_interval must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
