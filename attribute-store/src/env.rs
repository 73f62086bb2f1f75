//! Process environment access for the store.
//!
//! Every reader takes a key lookup so configuration can be built from a map
//! in tests and from `std::env` in the binary.

use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Load the nearest `.env` at or above `start`. Returns the file that was found.
pub fn load_dotenv_from(start: &Path) -> Option<PathBuf> {
    let found = start
        .ancestors()
        .map(|dir| dir.join(".env"))
        .find(|candidate| candidate.is_file())?;

    match dotenvy::from_path(&found) {
        Ok(()) => tracing::info!(path = %found.display(), "Loaded environment from .env"),
        Err(e) => tracing::warn!(path = %found.display(), error = %e, "Failed to load .env file"),
    }
    Some(found)
}

/// [`load_dotenv_from`] starting at the working directory.
pub fn load_dotenv() -> Option<PathBuf> {
    let cwd = std::env::current_dir()
        .map_err(|e| tracing::warn!(error = %e, "No working directory for .env lookup"))
        .ok()?;

    let found = load_dotenv_from(&cwd);
    if found.is_none() {
        tracing::info!(cwd = %cwd.display(), "No .env found; using process environment only");
    }
    found
}

/// Non-blank value of `key`.
pub fn non_blank(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

pub fn string_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    non_blank(lookup, key).unwrap_or_else(|| default.to_string())
}

pub fn parsed_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = non_blank(lookup, key) else {
        return Ok(default);
    };
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={raw}: {e}"))
}

/// Comma-separated list; blank entries are skipped.
pub fn csv_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &[&str]) -> Vec<String> {
    match lookup(key) {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect(),
        None => default.iter().map(|s| (*s).to_string()).collect(),
    }
}
