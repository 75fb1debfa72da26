use crate::error::{Result, VaultScoutError};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Public client id of the Azure CLI. Chosen because it is well known and
/// pre-consented for Resource Manager in every tenant.
pub const AZURE_CLI_CLIENT_ID: &str = "04b07795-8ddb-461a-bbee-02f9e1bf7b46";

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_RESOURCE_MANAGER_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_SCOPE: &str = "https://management.core.windows.net//.default";
pub const DEFAULT_PAGE_SIZE: u32 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Runtime settings, read from `config.toml` and overridden by CLI flags
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub client_id: String,
    pub authority_host: String,
    pub resource_manager_endpoint: String,
    pub scope: String,
    pub page_size: u32,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_id: AZURE_CLI_CLIENT_ID.to_string(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            resource_manager_endpoint: DEFAULT_RESOURCE_MANAGER_ENDPOINT.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Reject values that would only fail later, halfway through sign-in.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(VaultScoutError::Config("client_id must not be empty".into()));
        }
        if self.page_size == 0 || self.page_size > 1000 {
            return Err(VaultScoutError::Config(format!(
                "page_size must be between 1 and 1000, got {}",
                self.page_size
            )));
        }
        for (key, value) in [
            ("authority_host", &self.authority_host),
            ("resource_manager_endpoint", &self.resource_manager_endpoint),
        ] {
            reqwest::Url::parse(value).map_err(|e| {
                VaultScoutError::Config(format!("{} is not a valid URL ({}): {}", key, value, e))
            })?;
        }
        Ok(())
    }
}

/// Locates and reads the settings file
#[derive(Clone, Debug)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let project_dirs = ProjectDirs::from("com", "vaultscout", "vaultscout").ok_or_else(|| {
            VaultScoutError::Config("Failed to determine config directory".into())
        })?;

        Ok(Self {
            config_dir: project_dirs.config_dir().to_path_buf(),
        })
    }

    /// Use an explicit directory instead of the platform default
    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Load settings; a missing file yields the defaults
    pub fn load_settings(&self) -> Result<Settings> {
        Self::load_settings_from(&self.config_file())
    }

    pub fn load_settings_from(path: &Path) -> Result<Settings> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Settings::default());
        }

        let contents = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&contents)?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}
