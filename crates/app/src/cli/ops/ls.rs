use clap::Args;
use common::fs::FsError;

use crate::cli::op::ContextError;

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Path to list (defaults to the root)
    #[arg(default_value = "/")]
    pub path: String,

    /// List recursively
    #[arg(long)]
    pub deep: bool,

    /// Print entries as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Ls {
    type Error = LsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut fs = ctx.filesystem().await?;

        let items = if self.deep {
            fs.ls_deep(&self.path).await?
        } else {
            fs.ls(&self.path).await?
        };

        if self.json {
            let entries: Vec<_> = items.values().collect();
            return Ok(serde_json::to_string_pretty(&entries)?);
        }

        if items.is_empty() {
            return Ok("No items found".to_string());
        }
        let output = items
            .values()
            .map(|item| {
                let type_str = if item.is_dir() { "dir" } else { "file" };
                format!("{} ({}) [{}]", item.path, type_str, item.id)
            })
            .collect::<Vec<_>>()
            .join("\n");
        Ok(output)
    }
}
