//! Static integration registry
//!
//! Each known integration carries a fixed list of credential keys with the
//! environment variable each key is exposed under inside a run. Integrations
//! the registry does not know get the uniform fallback variable name
//! `<INTEGRATION>_<KEY>` uppercased.

use std::collections::HashMap;

/// One credential an integration accepts.
pub struct CredentialSpec {
    pub key: &'static str,
    pub env_var: &'static str,
    pub required: bool,
}

/// A service scripts can talk to through provisioned credentials.
pub struct IntegrationSpec {
    pub name: &'static str,
    pub display_name: &'static str,
    pub credentials: &'static [CredentialSpec],
}

static INTEGRATIONS: &[IntegrationSpec] = &[
    IntegrationSpec {
        name: "gmail",
        display_name: "Gmail",
        credentials: &[
            CredentialSpec {
                key: "access_token",
                env_var: "GMAIL_ACCESS_TOKEN",
                required: true,
            },
            CredentialSpec {
                key: "refresh_token",
                env_var: "GMAIL_REFRESH_TOKEN",
                required: false,
            },
        ],
    },
    IntegrationSpec {
        name: "slack",
        display_name: "Slack",
        credentials: &[CredentialSpec {
            key: "bot_token",
            env_var: "SLACK_BOT_TOKEN",
            required: true,
        }],
    },
    IntegrationSpec {
        name: "discord",
        display_name: "Discord",
        credentials: &[CredentialSpec {
            key: "webhook_url",
            env_var: "DISCORD_WEBHOOK_URL",
            required: true,
        }],
    },
    // Built-in scheduling needs no credentials.
    IntegrationSpec {
        name: "cron",
        display_name: "Cron",
        credentials: &[],
    },
];

/// Looks up an integration by name.
pub fn get_integration(name: &str) -> Option<&'static IntegrationSpec> {
    INTEGRATIONS.iter().find(|spec| spec.name == name)
}

/// Credential keys an integration cannot run without.
///
/// Unknown integrations have no declared requirements, so any stored value
/// set satisfies them.
pub fn required_keys(integration: &str) -> Vec<&'static str> {
    get_integration(integration)
        .map(|spec| {
            spec.credentials
                .iter()
                .filter(|cred| cred.required)
                .map(|cred| cred.key)
                .collect()
        })
        .unwrap_or_default()
}

/// Maps stored credential values to the environment variables a run sees.
///
/// Keys the registry knows use their declared variable name; everything else
/// falls back to `<INTEGRATION>_<KEY>` uppercased.
pub fn env_for_credentials(
    integration: &str,
    values: &HashMap<String, String>,
) -> HashMap<String, String> {
    let spec = get_integration(integration);
    let mut env = HashMap::new();

    for (key, value) in values {
        let declared = spec.and_then(|spec| {
            spec.credentials
                .iter()
                .find(|cred| cred.key == key)
                .map(|cred| cred.env_var.to_string())
        });
        let var = declared.unwrap_or_else(|| {
            format!("{}_{}", integration.to_uppercase(), key.to_uppercase())
        });
        env.insert(var, value.clone());
    }

    env
}
