use clap::Args;
use common::fs::FsError;

use crate::cli::op::ContextError;

#[derive(Args, Debug, Clone)]
pub struct Touch {
    /// File to create if it does not exist
    pub path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TouchError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Fs(#[from] FsError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Touch {
    type Error = TouchError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut fs = ctx.filesystem().await?;
        fs.touch(&self.path).await?;
        Ok(fs.normalize(&self.path)?.to_string())
    }
}
