use clap::Args;
use common::fs::FsError;

use crate::cli::op::ContextError;

#[derive(Args, Debug, Clone)]
pub struct Mkdir {
    /// Folder to create
    pub path: String,

    /// Create missing parent folders as needed
    #[arg(short, long)]
    pub parents: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum MkdirError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Fs(#[from] FsError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Mkdir {
    type Error = MkdirError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut fs = ctx.filesystem().await?;
        fs.mkdir(&self.path, self.parents).await?;

        let id = fs.resolve(&self.path).await?.id;
        Ok(format!("Created {} [{}]", fs.normalize(&self.path)?, id))
    }
}
