pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "boxfs")]
#[command(about = "Path-based access to Box cloud storage")]
pub struct Args {
    /// Path to the boxfs config directory (defaults to ~/.boxfs)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Run against a throwaway in-memory store instead of Box
    #[arg(long, global = true)]
    pub memory: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: crate::Command,
}
