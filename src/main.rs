//! Actor Bridge
//!
//! Entry point: runs the HTTP bridge, or one of the client subcommands
//! against a running bridge.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use actor_bridge::config::{AppConfig, Cli, Command};
use actor_bridge::{cli, server, telemetry};
use clap::Parser;
use dotenvy::dotenv;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before clap reads its env-backed flags
    let _ = dotenv();

    let args = Cli::parse();
    let config = match AppConfig::from_cli(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    telemetry::init(config.log.format);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => server::start_server(Arc::new(config)).await,
        command => cli::execute(command, &config).await,
    }
}
