//! kernscope command line
//!
//! - report: one row per classified kernel (table, CSV or JSON)
//! - summary: GPU time per direction and per operation

use anyhow::Result;
use clap::{Parser, Subcommand};
use kernscope_cli::{commands, output};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "kernscope")]
#[command(about = "kernscope - map GPU kernels to framework operations", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one row per kernel with its direction, module and operation
    Report(commands::report::ReportArgs),

    /// Summarize GPU time per direction and operation
    Summary(commands::summary::SummaryArgs),
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        output::error(&e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Report(args) => {
            init_tracing(args.verbose);
            commands::report::run(args)
        }
        Commands::Summary(args) => {
            init_tracing(args.verbose);
            commands::summary::run(args)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
