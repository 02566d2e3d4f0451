use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use boxfs::{ApiError, AppState, BoxApiClient, StateError};
use common::fs::{BoxFs, FsConfig, FsError};
use common::remote::{MemoryRemote, RemoteClient};

/// The filesystem every op works against
pub type Fs = BoxFs<Arc<dyn RemoteClient>>;

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("failed to create API client: {0}")]
    Api(#[from] ApiError),
    #[error("failed to open filesystem: {0}")]
    Fs(#[from] FsError),
}

#[derive(Clone)]
pub struct OpContext {
    /// Optional custom config path (defaults to ~/.boxfs)
    pub config_path: Option<PathBuf>,
    /// Use an in-memory store instead of the Box API
    pub memory: bool,
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>, memory: bool) -> Self {
        Self {
            config_path,
            memory,
        }
    }

    pub fn state(&self) -> Result<AppState, StateError> {
        AppState::load(self.config_path.clone())
    }

    /// Open a filesystem handle as configured.
    ///
    /// In memory mode a missing config directory is fine and defaults apply.
    pub async fn filesystem(&self) -> Result<Fs, ContextError> {
        if self.memory {
            let config = match self.state() {
                Ok(state) => state.config.fs,
                Err(StateError::NotInitialized) => FsConfig::default(),
                Err(e) => return Err(e.into()),
            };
            let client: Arc<dyn RemoteClient> = Arc::new(MemoryRemote::new());
            return Ok(BoxFs::new(client, config).await?);
        }

        let state = self.state()?;
        let token = state.access_token()?;
        let client: Arc<dyn RemoteClient> =
            Arc::new(BoxApiClient::new(&state.config.api, &token)?);
        tracing::debug!("using Box API at {}", state.config.api.base_url);

        Ok(BoxFs::new(client, state.config.fs).await?)
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
