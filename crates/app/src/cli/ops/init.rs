use std::path::PathBuf;

use clap::Args;
use common::fs::{FsConfig, NameMatching};

use boxfs::state::{ApiConfig, AppConfig, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Identifier of the Box folder to use as the filesystem root
    #[arg(long)]
    pub root_id: Option<String>,

    /// Path of the root folder below "All Files" (ignored if --root-id is set)
    #[arg(long)]
    pub root_path: Option<String>,

    /// Access token to store in the config (BOXFS_ACCESS_TOKEN takes precedence)
    #[arg(long)]
    pub access_token: Option<String>,

    /// Match names case-insensitively while resolving paths
    #[arg(long)]
    pub case_insensitive: bool,

    /// Directory for log files, relative to the config directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut fs = FsConfig::default();
        if let Some(id) = &self.root_id {
            fs = fs.with_root_id(id.as_str());
        }
        if let Some(path) = &self.root_path {
            fs = fs.with_root_path(path.as_str());
        }
        if self.case_insensitive {
            fs = fs.with_name_matching(NameMatching::CaseInsensitive);
        }

        let config = AppConfig {
            api: ApiConfig {
                access_token: self.access_token.clone(),
                ..ApiConfig::default()
            },
            fs,
            log_dir: self.log_dir.clone(),
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let root = match (&state.config.fs.root_id, &state.config.fs.root_path) {
            (Some(id), _) => format!("folder {}", id),
            (None, Some(path)) => format!("path {}", path),
            (None, None) => "All Files".to_string(),
        };
        let token = if state.config.api.access_token.is_some() {
            "stored in config"
        } else {
            "not set (use BOXFS_ACCESS_TOKEN)"
        };

        Ok(format!(
            "Initialized boxfs directory at: {}\n\
             - Config: {}\n\
             - API: {}\n\
             - Root: {}\n\
             - Access token: {}",
            state.boxfs_dir.display(),
            state.config_path.display(),
            state.config.api.base_url,
            root,
            token
        ))
    }
}
