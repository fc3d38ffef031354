//! Reading JSON Lines traces from a file or stdin

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use kernscope_shared::utils::jsonl::TraceReader;
use kernscope_shared::TraceKernel;
use tracing::debug;

/// Refresh interval of the reading spinner
const SPINNER_TICK: Duration = Duration::from_millis(120);

/// Read every kernel of a trace. `None` or `-` reads stdin.
pub fn read_trace(path: Option<&Path>, show_progress: bool) -> Result<Vec<TraceKernel>> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open trace file {}", path.display()))?;
            let kernels = read_kernels(BufReader::new(file), show_progress)
                .with_context(|| format!("Failed to read trace file {}", path.display()))?;
            debug!("Read {} kernels from {}", kernels.len(), path.display());
            Ok(kernels)
        }
        _ => {
            let stdin = io::stdin();
            let kernels = read_kernels(stdin.lock(), show_progress)
                .context("Failed to read trace from stdin")?;
            debug!("Read {} kernels from stdin", kernels.len());
            Ok(kernels)
        }
    }
}

/// Decode kernels from any buffered reader, stopping at the first bad line
pub fn read_kernels<R: BufRead>(reader: R, show_progress: bool) -> Result<Vec<TraceKernel>> {
    let spinner = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(SPINNER_TICK);
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut trace = TraceReader::new(reader);
    let mut kernels = Vec::new();
    for kernel in trace.by_ref() {
        kernels.push(kernel?);
        if kernels.len() % 4096 == 0 {
            spinner.set_message(format!("Read {} kernels", kernels.len()));
        }
    }

    spinner.finish_and_clear();
    debug!(
        "Decoded {} kernels from {} lines",
        kernels.len(),
        trace.lines_read()
    );
    Ok(kernels)
}
