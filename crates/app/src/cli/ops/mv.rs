use clap::Args;
use common::fs::FsError;

use crate::cli::op::ContextError;

#[derive(Args, Debug, Clone)]
pub struct Mv {
    /// Existing file or folder
    pub from: String,

    /// New location; its parent folder must exist
    pub to: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MvError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Fs(#[from] FsError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Mv {
    type Error = MvError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut fs = ctx.filesystem().await?;
        let moved = fs.mv(&self.from, &self.to).await?;
        Ok(format!(
            "Moved {} -> {} [{}]",
            fs.normalize(&self.from)?,
            fs.normalize(&self.to)?,
            moved.id
        ))
    }
}
