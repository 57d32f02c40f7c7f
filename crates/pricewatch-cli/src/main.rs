use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod run;
mod sources;

#[derive(Debug, Parser)]
#[command(name = "pricewatch")]
#[command(about = "Normalize, clean and aggregate golf-club listings")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the pipeline over a collected batch and publish the results
    Run {
        /// JSON file of raw records keyed by source id
        #[arg(long)]
        input: PathBuf,
        /// Write the full report as JSON to this path
        #[arg(long)]
        output: Option<PathBuf>,
        /// Skip the spreadsheet upload and email notification
        #[arg(long)]
        dry_run: bool,
    },
    /// List configured sources and their field positions
    Sources,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(pricewatch_core::log_level_from_env()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = pricewatch_core::load_app_config().inspect_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
    })?;

    match cli.command {
        Some(Commands::Run {
            input,
            output,
            dry_run,
        }) => {
            let options = run::RunOptions {
                input,
                output,
                dry_run,
            };
            run::run(&config, &options).await
        }
        Some(Commands::Sources) => sources::list_sources(&config),
        None => {
            println!("pricewatch: use `pricewatch run --input <file>` or `pricewatch sources`");
            Ok(())
        }
    }
}
