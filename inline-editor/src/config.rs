use std::str::FromStr;
use std::time::Duration;

use crate::error::EditorError;

/// When a new edit session may start relative to outstanding writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// The session flag clears as soon as the editor closes; a second edit can
    /// begin while the first write is still in flight.
    #[default]
    Overlapping,
    /// New sessions are refused until every dispatched write has resolved.
    Serialized,
}

impl FromStr for WritePolicy {
    type Err = EditorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "overlapping" => Ok(Self::Overlapping),
            "serialized" => Ok(Self::Serialized),
            other => Err(EditorError::Config(format!(
                "Invalid write policy '{other}'. Expected 'overlapping' or 'serialized'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// JSON-RPC endpoint of the attribute store
    pub store_url: String,
    /// Upper bound on a single remote call
    pub request_timeout: Duration,
    pub write_policy: WritePolicy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            store_url: DEFAULT_STORE_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            write_policy: WritePolicy::default(),
        }
    }
}

const DEFAULT_STORE_URL: &str = "http://127.0.0.1:8090/rpc";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

impl EditorConfig {
    /// Read configuration from the process environment, after loading `.env`
    /// if one is present.
    pub fn from_env() -> Result<Self, EditorError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup; missing keys take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EditorError> {
        let store_url = lookup("ATTRIBUTE_STORE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STORE_URL.to_string());

        let timeout_ms = match lookup("ATTRIBUTE_RPC_TIMEOUT_MS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                EditorError::Config(format!(
                    "Failed to parse env var ATTRIBUTE_RPC_TIMEOUT_MS={raw}: {e}"
                ))
            })?,
            None => DEFAULT_TIMEOUT_MS,
        };

        let write_policy = match lookup("INLINE_EDIT_WRITE_POLICY") {
            Some(raw) => raw.parse()?,
            None => WritePolicy::default(),
        };

        Ok(Self {
            store_url,
            request_timeout: Duration::from_millis(timeout_ms),
            write_policy,
        })
    }
}
