//! Connection settings for the record store.
//!
//! Read from `<config_dir>/liidi-crm/config.json`; a missing file yields the
//! defaults. `PUBLIC_POCKETBASE_URL`, `CRM_EMAIL` and `CRM_PASSWORD` override
//! the file so credentials need not be written to disk.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CrmError, Result};
use crate::store::{PocketBaseClient, DEFAULT_BASE_URL};

const APP_DIR: &str = "liidi-crm";
const CONFIG_FILE: &str = "config.json";

pub const ENV_POCKETBASE_URL: &str = "PUBLIC_POCKETBASE_URL";
pub const ENV_EMAIL: &str = "CRM_EMAIL";
pub const ENV_PASSWORD: &str = "CRM_PASSWORD";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmConfig {
    pub pocketbase_url: String,
    pub email: String,
    pub password: String,
    pub request_timeout_secs: u64,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            pocketbase_url: DEFAULT_BASE_URL.to_string(),
            email: String::new(),
            password: String::new(),
            request_timeout_secs: 30,
        }
    }
}

impl CrmConfig {
    /// Default location of the config file.
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| CrmError::Config("could not find config directory".to_string()))?;
        Ok(dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from `path` (or the default location) and apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        let mut config = Self::read_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// File contents only; defaults when the file does not exist.
    pub fn read_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| CrmError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Replace fields with non-empty values returned by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_POCKETBASE_URL) {
            self.pocketbase_url = url;
        }
        if let Some(email) = get(ENV_EMAIL) {
            self.email = email;
        }
        if let Some(password) = get(ENV_PASSWORD) {
            self.password = password;
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn has_credentials(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Build a client for the configured instance and log in when credentials are set.
    pub async fn connect(&self) -> Result<PocketBaseClient> {
        let mut client = PocketBaseClient::with_timeout(&self.pocketbase_url, self.request_timeout())?;
        client.health().await?;
        if self.has_credentials() {
            client.auth_with_password(&self.email, &self.password).await?;
        } else {
            log::warn!("No credentials configured, continuing unauthenticated");
        }
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = CrmConfig::read_file(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, CrmConfig::default());
        assert_eq!(config.pocketbase_url, "http://127.0.0.1:8090");
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = CrmConfig {
            pocketbase_url: "https://crm.example.fi".to_string(),
            email: "myynti@example.fi".to_string(),
            password: "salasana".to_string(),
            request_timeout_secs: 10,
        };
        config.save(&path).unwrap();

        assert_eq!(CrmConfig::read_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"email": "a@b.fi"}"#).unwrap();

        let config = CrmConfig::read_file(&path).unwrap();
        assert_eq!(config.email, "a@b.fi");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(CrmConfig::read_file(&path), Err(CrmError::Config(_))));
    }

    #[test]
    fn test_overrides_skip_empty_values() {
        let env: HashMap<&str, &str> = [
            (ENV_POCKETBASE_URL, "http://10.0.0.5:8090"),
            (ENV_EMAIL, ""),
            (ENV_PASSWORD, "env-secret"),
        ]
        .into_iter()
        .collect();

        let mut config = CrmConfig {
            email: "file@example.fi".to_string(),
            ..Default::default()
        };
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.pocketbase_url, "http://10.0.0.5:8090");
        assert_eq!(config.email, "file@example.fi");
        assert_eq!(config.password, "env-secret");
    }

    #[test]
    fn test_timeout_never_zero() {
        let config = CrmConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }
}
