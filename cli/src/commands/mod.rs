//! Subcommand implementations

pub mod report;
pub mod summary;

use anyhow::Result;
use kernscope_gpu::ProfileSession;
use kernscope_shared::{Timestamp, TraceKernel};

use crate::output;

/// Classify a whole trace
///
/// Each rejected record is logged by the session; this adds a count on
/// stderr. Fails only when the trace was not empty and nothing survived.
pub fn classify_trace(profiling_start: Timestamp, kernels: Vec<TraceKernel>) -> Result<ProfileSession> {
    let total = kernels.len();
    let mut session = ProfileSession::new(profiling_start);
    let accepted = session.extend(kernels);

    if total > 0 && accepted == 0 {
        anyhow::bail!("All {} kernel records were rejected", total);
    }

    if accepted < total {
        output::warning(&format!("{} of {} kernels rejected", total - accepted, total));
    }

    Ok(session)
}
