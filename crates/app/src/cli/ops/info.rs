use clap::Args;
use common::fs::FsError;

use crate::cli::op::ContextError;

#[derive(Args, Debug, Clone)]
pub struct Info {
    /// Path to describe
    pub path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InfoError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Info {
    type Error = InfoError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut fs = ctx.filesystem().await?;
        let info = fs.info(&self.path).await?;
        Ok(serde_json::to_string_pretty(&info)?)
    }
}
