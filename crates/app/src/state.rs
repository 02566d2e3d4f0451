use std::{fs, path::PathBuf};

use common::fs::FsConfig;
use serde::{Deserialize, Serialize};
use url::Url;

pub const APP_NAME: &str = "boxfs";
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Overrides the access token stored in the config file
pub const ACCESS_TOKEN_ENV: &str = "BOXFS_ACCESS_TOKEN";

const DEFAULT_BASE_URL: &str = "https://api.box.com/2.0/";
const DEFAULT_UPLOAD_URL: &str = "https://upload.box.com/api/2.0/";
/// Box rejects simple uploads above 50 MiB
const DEFAULT_CHUNKED_UPLOAD_THRESHOLD: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Box content API endpoint
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Box upload API endpoint
    #[serde(default = "default_upload_url")]
    pub upload_url: Url,
    /// Developer or OAuth access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Uploads larger than this many bytes go through an upload session
    #[serde(default = "default_chunked_upload_threshold")]
    pub chunked_upload_threshold: u64,
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("hardcoded URL must parse")
}

fn default_upload_url() -> Url {
    Url::parse(DEFAULT_UPLOAD_URL).expect("hardcoded URL must parse")
}

fn default_chunked_upload_threshold() -> u64 {
    DEFAULT_CHUNKED_UPLOAD_THRESHOLD
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            upload_url: default_upload_url(),
            access_token: None,
            chunked_upload_threshold: DEFAULT_CHUNKED_UPLOAD_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    /// Root selection, path map and name matching for the filesystem
    #[serde(default)]
    pub fs: FsConfig,
    /// Directory for daily-rolling log files (no file logging if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the boxfs directory (~/.boxfs)
    pub boxfs_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the boxfs directory path (custom or default ~/.boxfs)
    pub fn boxfs_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new boxfs state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let boxfs_dir = Self::boxfs_dir(custom_path)?;

        if boxfs_dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }
        fs::create_dir_all(&boxfs_dir)?;

        let config = config.unwrap_or_default();
        let config_path = boxfs_dir.join(CONFIG_FILE_NAME);
        fs::write(&config_path, toml::to_string_pretty(&config)?)?;

        Ok(Self {
            boxfs_dir,
            config_path,
            config,
        })
    }

    /// Load existing state from the boxfs directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let boxfs_dir = Self::boxfs_dir(custom_path)?;
        let config_path = boxfs_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            boxfs_dir,
            config_path,
            config,
        })
    }

    /// The access token to use: environment first, then the config file
    pub fn access_token(&self) -> Result<String, StateError> {
        std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .filter(|token| !token.is_empty())
            .or_else(|| self.config.api.access_token.clone())
            .ok_or(StateError::MissingAccessToken)
    }

    /// Where log files go, relative paths taken from the boxfs directory
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.config
            .log_dir
            .as_ref()
            .map(|dir| self.boxfs_dir.join(dir))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("boxfs directory not initialized. Run 'boxfs init' first")]
    NotInitialized,

    #[error("boxfs directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("no access token: set {} or api.access_token in config.toml", ACCESS_TOKEN_ENV)]
    MissingAccessToken,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use common::fs::NameMatching;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_init_then_load() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("state");

        let mut config = AppConfig::default();
        config.fs.root_path = Some("Work".to_string());
        config.fs.name_matching = NameMatching::CaseInsensitive;

        let state = AppState::init(Some(dir.clone()), Some(config.clone())).unwrap();
        assert!(state.config_path.exists());

        let loaded = AppState::load(Some(dir)).unwrap();
        assert_eq!(loaded.config, config);
    }

    #[test]
    fn test_init_twice_fails() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().to_path_buf();

        AppState::init(Some(dir.clone()), None).unwrap();
        assert!(matches!(
            AppState::init(Some(dir), None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_uninitialized_fails() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            AppState::load(Some(temp.path().join("missing"))),
            Err(StateError::NotInitialized)
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            log_dir = "logs"

            [api]
            access_token = "abc"

            [fs]
            root_id = "12345"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(config.api.upload_url.as_str(), DEFAULT_UPLOAD_URL);
        assert_eq!(config.api.access_token.as_deref(), Some("abc"));
        assert_eq!(
            config.api.chunked_upload_threshold,
            DEFAULT_CHUNKED_UPLOAD_THRESHOLD
        );
        assert_eq!(config.fs.root_id.as_ref().map(|id| id.as_str()), Some("12345"));
        assert_eq!(config.log_dir, Some(PathBuf::from("logs")));
    }
}
