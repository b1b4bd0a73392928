//! Integration credential provisioning
//!
//! The registry describes which credential keys each integration needs and
//! the environment variable each key maps to; the store holds per-user
//! credential values and resolves them into a subprocess environment.

pub mod registry;
pub mod store;

pub use registry::{env_for_credentials, get_integration, required_keys};
pub use store::CredentialStore;
