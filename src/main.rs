use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "remedy")]
#[command(version, about = "Compliance violation remediation engine")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the engine configuration file (YAML). Defaults apply when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process signals end to end: analyze, decide, plan, execute or hand off
    Run {
        /// Signal file: one JSON object or a JSON array of signals
        #[arg(short, long)]
        signal: PathBuf,

        /// Print full execution summaries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Score signal complexity and automation feasibility without deciding
    Assess {
        /// Signal file: one JSON object or a JSON array of signals
        #[arg(short, long)]
        signal: PathBuf,

        /// Print the reports as JSON
        #[arg(long)]
        json: bool,
    },
    /// Produce remediation decisions without planning or executing
    Decide {
        /// Signal file: one JSON object or a JSON array of signals
        #[arg(short, long)]
        signal: PathBuf,

        /// Print the decisions as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Run { signal, json } => {
            cmd::cmd_run(cli.config.as_deref(), signal, *json).await?;
        }
        Commands::Assess { signal, json } => {
            cmd::cmd_assess(signal, *json)?;
        }
        Commands::Decide { signal, json } => {
            cmd::cmd_decide(cli.config.as_deref(), signal, *json).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
