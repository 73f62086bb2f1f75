use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::actors::ItemMap;
use crate::env;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Interface the store binds to
    pub host: String,
    /// Port the store listens on
    pub port: u16,
    /// Optional TOML file with the initial items
    pub seed_file: Option<PathBuf>,
    /// Browser origins allowed to call the RPC endpoint
    pub cors_origins: Vec<String>,
}

impl StoreConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup; missing or blank keys take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            host: env::string_or(&lookup, "ATTRIBUTE_STORE_HOST", "127.0.0.1"),
            port: env::parsed_or(&lookup, "ATTRIBUTE_STORE_PORT", 8090)?,
            seed_file: env::non_blank(&lookup, "ATTRIBUTE_STORE_SEED").map(PathBuf::from),
            cors_origins: env::csv_or(
                &lookup,
                "ATTRIBUTE_STORE_CORS_ORIGINS",
                &["http://localhost:3000", "http://127.0.0.1:3000"],
            ),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Seed file layout:
///
/// ```toml
/// [items."//userdata/alice"]
/// displayName = "Alice"
/// age = 33
/// ```
#[derive(Debug, serde::Deserialize)]
struct SeedFile {
    #[serde(default)]
    items: ItemMap,
}

pub fn load_seed(path: &Path) -> anyhow::Result<ItemMap> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    parse_seed(&raw).with_context(|| format!("Failed to parse seed file {}", path.display()))
}

pub fn parse_seed(raw: &str) -> anyhow::Result<ItemMap> {
    let seed: SeedFile = toml::from_str(raw)?;
    Ok(seed.items)
}
