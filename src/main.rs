mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::{DownOptions, UpOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "stackbox",
    about = "Ephemeral local cloud emulator for tests"
)]
struct Cli {
    /// Config file layered over ~/.config/stackbox/stackbox.toml and ./stackbox.toml
    #[arg(long, env = "STACKBOX_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Container runtime binary (docker or podman); auto-detected when unset
    #[arg(long, env = "STACKBOX_RUNTIME", global = true)]
    runtime: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch an emulator, wait for it and print shell exports
    Up(UpOptions),
    /// Purge an emulator started by `up`
    Down(DownOptions),
    /// List the locally routed services and their container ports
    Services,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stackbox=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse())
}

/// Config files and the runtime are only touched by commands that launch or
/// purge a container.
fn run(args: Cli) -> Result<()> {
    let context = || cli::Context::load(args.config.as_deref(), args.runtime.clone());

    match args.command {
        Commands::Up(options) => cli::up::run(options, &context()?),
        Commands::Down(options) => cli::down::run(options, &context()?),
        Commands::Services => cli::services::run(),
    }
}
