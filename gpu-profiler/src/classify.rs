//! Marker-based kernel classification
//!
//! Derives the training direction and the originating module/operation of a
//! kernel from the markers that were open when it was launched. Both are
//! heuristics: markers are instrumentation strings and do not always carry
//! the information, so the classifier degrades to `fprop` and `"na"` instead
//! of failing.
//!
//! The module/operation lookup is a strict waterfall. The first source that
//! yields anything wins:
//!
//! 1. structured framework markers
//! 2. autograd backward sequence markers, sanitized
//! 3. any sequence marker
//! 4. the first uncategorized marker, with an implicit `"na"` module

use std::fmt;

use kernscope_shared::{CorrelationId, MarkerInfo};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{ClassifyError, Result};
use crate::marker::FrameworkMarker;

/// Placeholder module (and operation label) when nothing better is known
pub const NA: &str = "na";

/// Sequence marker signatures of autograd backward nodes
///
/// Operation attribution uses all three, not just the first two, so that
/// `aten::mulBackward0, seq = 5` still sanitizes to `atenmul`.
const BACKWARD_SIGNATURES: &[&str] = &["Backward, seq = ", "backward, seq = ", "Backward0, seq = "];

/// Signature shared by every autograd sequence marker
const SEQUENCE_SIGNATURE: &str = ", seq = ";

/// Removed from backward operation names, in this order
const BACKWARD_NOISE: &[&str] = &[
    "torch",
    "autograd",
    "_backward",
    "::",
    "jit",
    "(anonymous namespace)",
];

/// Training phase that issued a kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "fprop")]
    Forward,
    #[serde(rename = "bprop")]
    Backward,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "fprop",
            Direction::Backward => "bprop",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which marker source produced an attribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerSource {
    Framework,
    BackwardSequence,
    Sequence,
}

/// One module/operation pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpAttribution {
    #[serde(rename = "mod")]
    pub module: String,
    #[serde(rename = "op")]
    pub operation: String,
}

impl OpAttribution {
    fn unknown_module(operation: impl Into<String>) -> Self {
        Self {
            module: NA.to_string(),
            operation: operation.into(),
        }
    }
}

/// Module/operation attribution of a kernel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribution {
    /// One module per operation, one entry per attributed marker
    Paired {
        source: MarkerSource,
        entries: Vec<OpAttribution>,
    },

    /// Fallback: a single implicit `"na"` module with zero or one operation
    Implicit { operation: Option<String> },
}

impl Attribution {
    /// Module list as reported by the profiler table
    pub fn modules(&self) -> Vec<&str> {
        match self {
            Attribution::Paired { entries, .. } => {
                entries.iter().map(|e| e.module.as_str()).collect()
            }
            Attribution::Implicit { .. } => vec![NA],
        }
    }

    /// Operation list as reported by the profiler table; for the fallback
    /// this may be empty while `modules()` still holds `"na"`
    pub fn operations(&self) -> Vec<&str> {
        match self {
            Attribution::Paired { entries, .. } => {
                entries.iter().map(|e| e.operation.as_str()).collect()
            }
            Attribution::Implicit { operation } => operation.iter().map(String::as_str).collect(),
        }
    }

    /// Short `module/operation` label used to group kernels
    pub fn label(&self) -> String {
        match self {
            Attribution::Paired { entries, .. } => entries
                .iter()
                .map(|e| format!("{}/{}", e.module, e.operation))
                .collect::<Vec<_>>()
                .join(","),
            Attribution::Implicit {
                operation: Some(op),
            } => format!("{}/{}", NA, op),
            Attribution::Implicit { operation: None } => NA.to_string(),
        }
    }
}

/// Forward unless some sequence marker carries a backward signature
pub fn derive_direction(seq_markers: &[String]) -> Direction {
    if seq_markers.iter().any(|m| is_backward_marker(m)) {
        Direction::Backward
    } else {
        Direction::Forward
    }
}

/// Attribute a kernel to module/operation pairs
///
/// Fails only when a structured framework marker is malformed.
pub fn derive_classification(
    correlation_id: CorrelationId,
    markers: &MarkerInfo,
) -> Result<Attribution> {
    let framework = framework_attribution(correlation_id, markers)?;
    if !framework.is_empty() {
        return Ok(paired(MarkerSource::Framework, framework));
    }

    let backward: Vec<_> = markers
        .seq_markers
        .iter()
        .filter(|m| is_backward_marker(m))
        .map(|m| OpAttribution::unknown_module(sanitize_backward_op(before_first_comma(m))))
        .collect();
    if !backward.is_empty() {
        return Ok(paired(MarkerSource::BackwardSequence, backward));
    }

    let sequence: Vec<_> = markers
        .seq_markers
        .iter()
        .filter(|m| m.contains(SEQUENCE_SIGNATURE))
        .map(|m| OpAttribution::unknown_module(before_first_comma(m)))
        .collect();
    if !sequence.is_empty() {
        return Ok(paired(MarkerSource::Sequence, sequence));
    }

    trace!(
        "No framework or sequence markers for correlation id {}, using fallback",
        correlation_id
    );
    Ok(Attribution::Implicit {
        operation: markers.other_markers.first().cloned(),
    })
}

fn paired(source: MarkerSource, entries: Vec<OpAttribution>) -> Attribution {
    Attribution::Paired { source, entries }
}

fn framework_attribution(
    correlation_id: CorrelationId,
    markers: &MarkerInfo,
) -> Result<Vec<OpAttribution>> {
    markers
        .framework_markers
        .iter()
        .map(|raw| {
            FrameworkMarker::parse(raw)
                .map(|m| OpAttribution {
                    module: m.module,
                    operation: m.op,
                })
                .map_err(|reason| ClassifyError::MalformedMarker {
                    correlation_id,
                    marker: raw.to_text(),
                    reason,
                })
        })
        .collect()
}

fn is_backward_marker(marker: &str) -> bool {
    BACKWARD_SIGNATURES.iter().any(|sig| marker.contains(sig))
}

fn before_first_comma(marker: &str) -> &str {
    match marker.find(',') {
        Some(pos) => &marker[..pos],
        None => marker,
    }
}

/// `"torch::autograd::AddmmBackward"` -> `"Addmm"`
fn sanitize_backward_op(name: &str) -> String {
    let mut op = name.to_string();
    for noise in BACKWARD_NOISE {
        op = op.replace(noise, "");
    }
    if let Some(pos) = op.find("Backward") {
        op.truncate(pos);
    }
    op
}
