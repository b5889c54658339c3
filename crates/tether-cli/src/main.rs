use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "tether", version, about = "Tether CLI")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the API server.
    Serve {
        /// Path to tether.yaml (defaults to TETHER_CONFIG or ./tether.yaml).
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List registered providers.
    Providers,

    /// Show a provider's declared action catalog.
    Actions {
        /// Provider id.
        #[arg(long, default_value = "github")]
        provider: String,
    },

    /// Exercise the demo pipeline: connect, discover, plan, dry-run, and
    /// optionally execute and roll back.
    Demo {
        /// Free-form intent to plan for.
        #[arg(long, default_value = "protect the main branch of acme/website")]
        intent: String,

        /// Execute the plan for real after the dry-run.
        #[arg(long, default_value_t = false)]
        execute: bool,

        /// Roll the run back afterwards (implies --execute).
        #[arg(long, default_value_t = false)]
        rollback: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Serve { config } => commands::serve::run(config).await,
        Command::Providers => commands::providers::run(),
        Command::Actions { provider } => commands::actions::run(&provider),
        Command::Demo {
            intent,
            execute,
            rollback,
        } => commands::demo::run(&intent, execute || rollback, rollback).await,
    }
}
