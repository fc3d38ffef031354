//! Profiling session
//!
//! A session fixes the profiling start for one trace and collects the
//! classified records in input order. Records that fail ingestion or
//! classification are set aside with their error instead of aborting the
//! session.

use kernscope_shared::{TraceKernel, Timestamp};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::demangle::{Demangler, SymbolicDemangler};
use crate::error::{ClassifyError, Result};
use crate::metrics::SessionSummary;
use crate::record::KernelRecord;

/// Read-only values shared by every record of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionContext {
    /// Every kernel must start strictly after this timestamp
    pub profiling_start: Timestamp,
}

/// Ordered collection of classified kernel records for one trace
pub struct ProfileSession {
    context: SessionContext,
    demangler: Box<dyn Demangler>,
    records: Vec<KernelRecord>,
    rejected: Vec<ClassifyError>,
}

impl ProfileSession {
    /// Create a session that demangles kernel names with `symbolic`
    pub fn new(profiling_start: Timestamp) -> Self {
        Self::with_demangler(profiling_start, Box::new(SymbolicDemangler))
    }

    pub fn with_demangler(profiling_start: Timestamp, demangler: Box<dyn Demangler>) -> Self {
        Self {
            context: SessionContext { profiling_start },
            demangler,
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }

    /// Ingest and classify one kernel without recording it
    pub fn process(&self, kernel: TraceKernel) -> Result<KernelRecord> {
        process_kernel(&self.context, self.demangler.as_ref(), kernel)
    }

    /// Ingest and classify one kernel, keeping the result or the rejection
    ///
    /// Returns whether the kernel was accepted.
    pub fn push(&mut self, kernel: TraceKernel) -> bool {
        let result = self.process(kernel);
        self.record(result)
    }

    /// Process a batch in parallel, keeping input order
    ///
    /// Returns the number of accepted kernels.
    pub fn extend(&mut self, kernels: Vec<TraceKernel>) -> usize {
        let context = self.context;
        let demangler = self.demangler.as_ref();
        let results: Vec<_> = kernels
            .into_par_iter()
            .map(|kernel| process_kernel(&context, demangler, kernel))
            .collect();

        results
            .into_iter()
            .map(|result| self.record(result))
            .filter(|&accepted| accepted)
            .count()
    }

    fn record(&mut self, result: Result<KernelRecord>) -> bool {
        match result {
            Ok(record) => {
                self.records.push(record);
                true
            }
            Err(e) => {
                warn!("Skipping kernel: {}", e);
                self.rejected.push(e);
                false
            }
        }
    }

    /// Classified records in input order
    pub fn records(&self) -> &[KernelRecord] {
        &self.records
    }

    /// Errors of the kernels that were set aside, in input order
    pub fn rejected(&self) -> &[ClassifyError] {
        &self.rejected
    }

    pub fn summary(&self) -> SessionSummary {
        let summary = SessionSummary::from_records(&self.records, self.rejected.len());
        info!(
            "Session summary: {} kernels classified, {} rejected",
            summary.kernel_count, summary.rejected_count
        );
        summary
    }
}

fn process_kernel(
    ctx: &SessionContext,
    demangler: &dyn Demangler,
    kernel: TraceKernel,
) -> Result<KernelRecord> {
    let TraceKernel {
        launch,
        runtime,
        markers,
    } = kernel;
    KernelRecord::ingest(ctx, &launch, &runtime, markers, demangler)?.classify()
}
