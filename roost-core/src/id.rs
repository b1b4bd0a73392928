//! Prefixed identifier generation
//!
//! Deployment and run ids are persisted and must keep their format stable:
//! `dep_<16 hex>` and `run_<16 hex>`.

use uuid::Uuid;

/// Prefix used for deployment ids.
pub const DEPLOYMENT_PREFIX: &str = "dep";

/// Prefix used for run ids.
pub const RUN_PREFIX: &str = "run";

/// Generates a unique id of the form `{prefix}_{16 hex chars}`.
pub fn generate_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &hex[..16])
}
