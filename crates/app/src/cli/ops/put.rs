use std::path::PathBuf;

use clap::Args;
use common::fs::FsError;

use crate::cli::op::ContextError;

#[derive(Args, Debug, Clone)]
pub struct Put {
    /// Local file to upload
    pub local: PathBuf,

    /// Destination path in Box
    pub remote: String,

    /// Replace an existing file with a new version
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum PutError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Put {
    type Error = PutError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let data = tokio::fs::read(&self.local)
            .await
            .map_err(|e| PutError::Read(self.local.clone(), e))?;

        let mut fs = ctx.filesystem().await?;
        let info = fs.write(&self.remote, data, self.overwrite).await?;

        Ok(format!(
            "Uploaded {} -> {} ({} bytes) [{}]",
            self.local.display(),
            info.path,
            info.size,
            info.id
        ))
    }
}
