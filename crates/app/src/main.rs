// CLI modules
mod cli;

use boxfs::logging::init_logging;
use boxfs::AppState;
use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Cat, Cp, Info, Init, Ls, Mkdir, Mv, Put, Rm, Sign, Touch, Version};

command_enum! {
    (Init, Init),
    (Version, Version),
    (Ls, Ls),
    (Info, Info),
    (Mkdir, Mkdir),
    (Rm, Rm),
    (Mv, Mv),
    (Cp, Cp),
    (Cat, Cat),
    (Put, Put),
    (Touch, Touch),
    (Sign, Sign),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // File logging only once the config directory exists
    let log_dir = AppState::load(args.config_path.clone())
        .ok()
        .and_then(|state| state.log_dir());
    let guards = init_logging(&args.log_level, log_dir.as_deref());

    let ctx = cli::op::OpContext::new(args.config_path, args.memory);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            tracing::debug!("command failed: {:?}", e);
            eprintln!("Error: {}", e);
            1
        }
    };

    // flush buffered log lines before exiting
    drop(guards);
    std::process::exit(code);
}
