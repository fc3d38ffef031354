//! Report command implementation

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use kernscope_shared::TraceKernel;
use tracing::info;

use crate::config::{OutputFormat, Overrides, ReportConfig, Settings};
use crate::{input, render};

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// JSON Lines trace to read; stdin when omitted or `-`
    pub file: Option<PathBuf>,

    /// Comma separated columns to print
    /// (default: idx,dir,sub,mod,op,kernel,kernel_long,sil)
    #[arg(short, long)]
    pub columns: Option<String>,

    /// Print comma separated values instead of a table
    #[arg(long, conflicts_with_all = ["width", "json"])]
    pub csv: bool,

    /// Table width, 0 for unbounded
    #[arg(short, long)]
    pub width: Option<usize>,

    /// Print one JSON object per kernel
    #[arg(long, conflicts_with = "width")]
    pub json: bool,

    /// Kernels must start strictly after this timestamp (ns)
    #[arg(long)]
    pub profiling_start: Option<u64>,

    /// Settings file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl ReportArgs {
    fn overrides(&self) -> Overrides {
        let format = if self.csv {
            Some(OutputFormat::Csv)
        } else if self.json {
            Some(OutputFormat::Json)
        } else {
            None
        };

        Overrides {
            profiling_start: self.profiling_start,
            columns: self.columns.clone(),
            width: self.width,
            format,
        }
    }

    /// Merge settings file, environment and flags
    pub fn resolve(&self) -> Result<ReportConfig> {
        let settings = Settings::load(self.config.as_deref())?;
        ReportConfig::resolve(settings, self.overrides())
    }
}

pub fn run(args: ReportArgs) -> Result<()> {
    let config = args.resolve()?;
    let kernels = input::read_trace(args.file.as_deref(), !args.verbose)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let printed = write_report(&mut out, &config, kernels)?;
    out.flush().context("Failed to flush report")?;

    info!("Printed {} kernels", printed);
    Ok(())
}

/// Classify `kernels` and render them to `out`, returning the row count
pub fn write_report<W: Write>(
    out: &mut W,
    config: &ReportConfig,
    kernels: Vec<TraceKernel>,
) -> Result<usize> {
    let session = super::classify_trace(config.profiling_start, kernels)?;
    render::write_records(out, session.records(), config)?;
    Ok(session.records().len())
}
