use clap::Args;
use common::fs::FsError;

use crate::cli::op::ContextError;

#[derive(Args, Debug, Clone)]
pub struct Rm {
    /// File or folder to remove
    pub path: String,

    /// Remove folders and everything in them
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RmError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Fs(#[from] FsError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Rm {
    type Error = RmError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut fs = ctx.filesystem().await?;
        if self.recursive {
            fs.rm(&self.path).await?;
        } else {
            fs.rm_file(&self.path).await?;
        }
        Ok(format!("Removed {}", fs.normalize(&self.path)?))
    }
}
