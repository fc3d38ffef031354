//! Error types for kernel ingestion and classification
//!
//! Both kinds are tied to a single record through its correlation id so the
//! caller can report the record and move on to the next one.

use kernscope_shared::{CorrelationId, Timestamp};
use thiserror::Error;

use crate::marker::MarkerError;

/// Result type alias for classification operations
pub type Result<T> = std::result::Result<T, ClassifyError>;

/// Errors that reject a single kernel record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    /// Malformed or contradictory timestamps
    #[error("data integrity violation (correlation id {correlation_id}): {violation}")]
    DataIntegrity {
        correlation_id: CorrelationId,
        violation: IntegrityViolation,
    },

    /// Structured framework marker that does not carry `op`, `mod` and `args`
    #[error("malformed framework marker (correlation id {correlation_id}): {reason}: {marker}")]
    MalformedMarker {
        correlation_id: CorrelationId,
        marker: String,
        reason: MarkerError,
    },
}

impl ClassifyError {
    /// Correlation id of the offending record
    pub fn correlation_id(&self) -> CorrelationId {
        match self {
            ClassifyError::DataIntegrity { correlation_id, .. } => *correlation_id,
            ClassifyError::MalformedMarker { correlation_id, .. } => *correlation_id,
        }
    }
}

/// The timing invariant a record broke
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityViolation {
    /// Seen on very large profiles, usually with start = end = 0
    #[error("kernel end {end} is not after kernel start {start}")]
    EmptyKernelInterval { start: Timestamp, end: Timestamp },

    #[error("kernel start {start} is not after profiling start {profiling_start}")]
    StartsBeforeProfiling {
        start: Timestamp,
        profiling_start: Timestamp,
    },

    #[error("runtime call end {r_end} is not after runtime call start {r_start}")]
    EmptyRuntimeInterval { r_start: Timestamp, r_end: Timestamp },

    #[error("runtime call start {r_start} is not before kernel start {kernel_start}")]
    LaunchAfterKernel {
        r_start: Timestamp,
        kernel_start: Timestamp,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_correlation_id() {
        let err = ClassifyError::DataIntegrity {
            correlation_id: 17,
            violation: IntegrityViolation::EmptyKernelInterval { start: 0, end: 0 },
        };
        assert_eq!(err.correlation_id(), 17);
        assert_eq!(
            err.to_string(),
            "data integrity violation (correlation id 17): kernel end 0 is not after kernel start 0"
        );

        let err = ClassifyError::MalformedMarker {
            correlation_id: 3,
            marker: "{'op': 'relu'}".to_string(),
            reason: MarkerError::MissingField("mod"),
        };
        assert_eq!(err.correlation_id(), 3);
        assert!(err.to_string().contains("missing required field `mod`"));
    }
}
