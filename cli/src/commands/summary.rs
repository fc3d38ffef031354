//! Summary command implementation

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use kernscope_gpu::SessionSummary;
use kernscope_shared::utils::format_duration_ns;

use crate::config::Settings;
use crate::input;

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// JSON Lines trace to read; stdin when omitted or `-`
    pub file: Option<PathBuf>,

    /// Kernels must start strictly after this timestamp (ns)
    #[arg(long)]
    pub profiling_start: Option<u64>,

    /// Number of operations to list
    #[arg(long, default_value = "10")]
    pub top: usize,

    /// Print the summary as a JSON object
    #[arg(long)]
    pub json: bool,

    /// Settings file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn run(args: SummaryArgs) -> Result<()> {
    let settings = Settings::load(args.config.as_deref())?;
    let profiling_start = args
        .profiling_start
        .or(settings.profiling_start)
        .unwrap_or(0);

    let kernels = input::read_trace(args.file.as_deref(), !args.verbose)?;
    let summary = super::classify_trace(profiling_start, kernels)?.summary();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &summary)?;
        writeln!(out)?;
    } else {
        write_summary(&mut out, &summary, args.top)?;
    }
    out.flush().context("Failed to flush summary")
}

/// Human readable summary listing at most `top` operations
pub fn write_summary<W: Write>(out: &mut W, summary: &SessionSummary, top: usize) -> Result<()> {
    writeln!(
        out,
        "Kernels:   {} classified, {} rejected",
        summary.kernel_count, summary.rejected_count
    )?;
    writeln!(
        out,
        "GPU time:  {}",
        format_duration_ns(summary.total_gpu_time_ns)
    )?;

    for (name, totals) in [("Forward", &summary.forward), ("Backward", &summary.backward)] {
        writeln!(
            out,
            "{:<10} {} kernels, {} ({:.1}%)",
            format!("{}:", name),
            totals.kernel_count,
            format_duration_ns(totals.gpu_time_ns),
            summary.share_pct(totals)
        )?;
    }

    if summary.operations.is_empty() || top == 0 {
        return Ok(());
    }

    writeln!(out)?;
    writeln!(out, "Top operations by GPU time:")?;
    writeln!(
        out,
        "{:>12}  {:>6}  {:>7}  Operation",
        "Time", "Share", "Kernels"
    )?;
    for op in summary.operations.iter().take(top) {
        writeln!(
            out,
            "{:>12}  {:>5.1}%  {:>7}  {}",
            format_duration_ns(op.totals.gpu_time_ns),
            summary.share_pct(&op.totals),
            op.totals.kernel_count,
            op.label
        )?;
    }

    let hidden = summary.operations.len().saturating_sub(top);
    if hidden > 0 {
        writeln!(out, "... {} more", hidden)?;
    }
    Ok(())
}
