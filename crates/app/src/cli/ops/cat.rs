use clap::Args;
use common::fs::FsError;

use crate::cli::op::ContextError;

#[derive(Args, Debug, Clone)]
pub struct Cat {
    /// File to read
    pub path: String,

    /// First byte to read
    #[arg(long)]
    pub offset: Option<u64>,

    /// Number of bytes to read
    #[arg(long)]
    pub length: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Fs(#[from] FsError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Cat {
    type Error = CatError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut fs = ctx.filesystem().await?;

        let bytes = match (self.offset, self.length) {
            (None, None) => fs.cat(&self.path).await?,
            (offset, length) => {
                let start = offset.unwrap_or(0);
                let end = length.map_or(u64::MAX, |length| start.saturating_add(length));
                fs.cat_range(&self.path, start..end).await?
            }
        };

        // Try to convert to UTF-8 string, or show hex if binary
        match std::str::from_utf8(&bytes) {
            Ok(text) => Ok(text.to_string()),
            Err(_) => {
                let hex = bytes
                    .iter()
                    .map(|b| format!("{:02x}", b))
                    .collect::<Vec<_>>()
                    .join(" ");
                Ok(format!(
                    "Binary content ({} bytes, hex): {}",
                    bytes.len(),
                    hex
                ))
            }
        }
    }
}
