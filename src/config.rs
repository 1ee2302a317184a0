//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use crate::usecase::store::StorageLayout;

pub const API_URL_ENV: &str = "TASUKU_API_URL";

#[derive(Debug, Clone)]
pub struct Config {
    /// Key layout used in the key-value store.
    pub layout: StorageLayout,
    /// Delay between toggling a todo and re-filtering the visible list.
    pub refilter_delay: Duration,
    /// How long the duplicate hint stays visible.
    pub hint_duration: Duration,
    /// Todos endpoint; when set the backend owns the todo collection.
    pub api_url: Option<String>,
    pub request_timeout: Duration,
    /// Render loop tick.
    pub tick: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: StorageLayout::SingleBlob,
            refilter_delay: Duration::from_millis(800),
            hint_duration: Duration::from_millis(2400),
            api_url: None,
            request_timeout: Duration::from_secs(10),
            tick: Duration::from_millis(120),
        }
    }
}

/// Per-user data directory for the database and log file.
pub fn app_data_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().context("failed to resolve data dir")?;
    Ok(base.join("tasuku"))
}

/// Endpoint from `TASUKU_API_URL`; unset means local-only operation.
pub fn api_url_from_env() -> Result<Option<String>> {
    match std::env::var(API_URL_ENV) {
        Ok(raw) => non_blank(API_URL_ENV, &raw).map(Some),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(anyhow!("failed to read env {API_URL_ENV}: {e}")),
    }
}

pub fn non_blank(name: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("{name} is empty after trimming"));
    }
    Ok(trimmed.to_string())
}
