//! Client configuration management.
//!
//! This module handles loading and saving the client configuration, which
//! holds the backend base URL, the request timeout, the session storage
//! medium and the last email used to log in.
//!
//! Configuration is stored at `~/.config/policydesk/config.json` and the
//! file-backed session under the cache directory; `POLICYDESK_HOME` moves
//! both. The `POLICYDESK_API_URL` and `POLICYDESK_TIMEOUT_SECS` environment
//! variables override the stored values.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::storage::write_atomic;
use crate::auth::{FileStorage, KeyringStorage, StorageBackend};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "policydesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend base URL used when nothing is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8081/api/v1";

/// HTTP request timeout in seconds.
/// Applies to every call including the refresh exchange, so a hung backend
/// fails the call instead of blocking it forever.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const API_URL_ENV: &str = "POLICYDESK_API_URL";
const TIMEOUT_ENV: &str = "POLICYDESK_TIMEOUT_SECS";
/// Overrides both the config and the session directory.
const HOME_ENV: &str = "POLICYDESK_HOME";

/// Where the token store keeps the session between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub storage: StorageKind,
    #[serde(default)]
    pub last_email: Option<String>,
    /// Where the file medium keeps `session.json`; the cache dir if unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_path: Option<PathBuf>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            storage: StorageKind::default(),
            last_email: None,
            session_path: None,
        }
    }
}

impl Config {
    /// Load the stored config (or defaults) and apply environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read config file {}", path.display()))
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        write_atomic(path, &contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(secs) = lookup(TIMEOUT_ENV).and_then(|s| s.trim().parse().ok()) {
            self.request_timeout_secs = secs;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    fn config_path() -> Result<PathBuf> {
        Ok(app_dir(dirs::config_dir(), "config")?.join(CONFIG_FILE))
    }

    /// Directory of the session file, or `None` when the session lives in
    /// the keychain.
    pub fn session_dir(&self) -> Result<Option<PathBuf>> {
        match (self.storage, &self.session_path) {
            (StorageKind::Keyring, _) => Ok(None),
            (StorageKind::File, Some(dir)) => Ok(Some(dir.clone())),
            (StorageKind::File, None) => app_dir(dirs::cache_dir(), "cache").map(Some),
        }
    }

    /// Build the storage medium selected by `storage`.
    pub fn storage_backend(&self) -> Result<Arc<dyn StorageBackend>> {
        Ok(match self.session_dir()? {
            Some(dir) => Arc::new(FileStorage::new(dir)),
            None => Arc::new(KeyringStorage::new(APP_NAME)),
        })
    }
}

/// `$POLICYDESK_HOME` if set, else the platform directory plus the app name.
fn app_dir(platform_dir: Option<PathBuf>, kind: &str) -> Result<PathBuf> {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|h| !h.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    platform_dir
        .map(|dir| dir.join(APP_NAME))
        .ok_or_else(|| anyhow!("Could not find {} directory", kind))
}
