use clap::Args;
use common::fs::FsError;

use crate::cli::op::ContextError;

#[derive(Args, Debug, Clone)]
pub struct Cp {
    /// Existing file or folder
    pub from: String,

    /// Destination; must not exist yet
    pub to: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CpError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Fs(#[from] FsError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Cp {
    type Error = CpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut fs = ctx.filesystem().await?;
        let copy = fs.cp_file(&self.from, &self.to).await?;
        Ok(format!(
            "Copied {} -> {} [{}]",
            fs.normalize(&self.from)?,
            fs.normalize(&self.to)?,
            copy.id
        ))
    }
}
