//! Session-level GPU time accounting

use std::collections::HashMap;

use serde::Serialize;

use crate::classify::Direction;
use crate::record::KernelRecord;

/// Kernel count and silicon time for one group of kernels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KernelTotals {
    pub kernel_count: usize,
    pub gpu_time_ns: u64,
}

impl KernelTotals {
    fn add(&mut self, duration_ns: u64) {
        self.kernel_count += 1;
        self.gpu_time_ns += duration_ns;
    }
}

/// Totals for one `module/operation` label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationTotals {
    pub label: String,
    #[serde(flatten)]
    pub totals: KernelTotals,
}

/// Aggregate view of a classified session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub kernel_count: usize,
    pub rejected_count: usize,
    pub total_gpu_time_ns: u64,
    pub forward: KernelTotals,
    pub backward: KernelTotals,
    /// Sorted by descending GPU time, then label
    pub operations: Vec<OperationTotals>,
}

impl SessionSummary {
    pub fn from_records(records: &[KernelRecord], rejected_count: usize) -> Self {
        let mut aggregator = SummaryAggregator::default();
        for record in records {
            aggregator.add_record(record);
        }
        aggregator.finish(rejected_count)
    }

    /// Share of the total GPU time spent in `totals`, in percent
    pub fn share_pct(&self, totals: &KernelTotals) -> f64 {
        if self.total_gpu_time_ns == 0 {
            0.0
        } else {
            totals.gpu_time_ns as f64 * 100.0 / self.total_gpu_time_ns as f64
        }
    }
}

#[derive(Default)]
struct SummaryAggregator {
    all: KernelTotals,
    forward: KernelTotals,
    backward: KernelTotals,
    operations: HashMap<String, KernelTotals>,
}

impl SummaryAggregator {
    fn add_record(&mut self, record: &KernelRecord) {
        let duration = record.kernel_duration();
        self.all.add(duration);

        match record.direction() {
            Some(Direction::Forward) => self.forward.add(duration),
            Some(Direction::Backward) => self.backward.add(duration),
            None => {}
        }

        if let Some(attribution) = record.attribution() {
            self.operations
                .entry(attribution.label())
                .or_default()
                .add(duration);
        }
    }

    fn finish(self, rejected_count: usize) -> SessionSummary {
        let mut operations: Vec<_> = self
            .operations
            .into_iter()
            .map(|(label, totals)| OperationTotals { label, totals })
            .collect();
        operations.sort_by(|a, b| {
            b.totals
                .gpu_time_ns
                .cmp(&a.totals.gpu_time_ns)
                .then_with(|| a.label.cmp(&b.label))
        });

        SessionSummary {
            kernel_count: self.all.kernel_count,
            rejected_count,
            total_gpu_time_ns: self.all.gpu_time_ns,
            forward: self.forward,
            backward: self.backward,
            operations,
        }
    }
}
