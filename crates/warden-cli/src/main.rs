use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "warden")]
#[command(
    about = "WARDEN - Watchdog Agent for Relationship Decisions on External Networks",
    long_about = None
)]
struct Cli {
    /// Path to the runtime configuration file
    /// (defaults to ~/.config/warden/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relationship watchdog agent (the default)
    Run {
        /// Session transport provider to connect with
        #[arg(long)]
        transport: Option<String>,
    },
    /// Probe one profile's comment visibility and exit
    Check {
        /// Numeric account identifier of the profile to probe
        account: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.config;
    let result = match cli.command.unwrap_or(Commands::Run { transport: None }) {
        Commands::Run { transport } => commands::run::execute(config, transport).await,
        Commands::Check { account } => commands::check::execute(config, &account).await,
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("fatal: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let default_level = "info";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
