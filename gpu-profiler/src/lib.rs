//! GPU kernel classification
//!
//! Reconstructs, for each CUDA kernel launch of a profiled training or
//! inference run, the framework operation that issued it and the training
//! phase it belongs to.
//!
//! ```
//! use kernscope_gpu::{Direction, ProfileSession};
//! use kernscope_shared::TraceKernel;
//!
//! let kernel: TraceKernel = serde_json::from_str(r#"{
//!     "nameId": 1, "correlationId": 7, "start": 2000, "end": 2400,
//!     "deviceId": 0, "streamId": 7,
//!     "gridX": 80, "gridY": 1, "gridZ": 1, "blockX": 256, "blockY": 1, "blockZ": 1,
//!     "name": "void at::native::vectorized_elementwise_kernel<4>(int)",
//!     "rStart": 1500, "rEnd": 1510, "pid": 1, "tid": 1, "objId": 0,
//!     "markers": { "seqMarkers": ["MulBackward0, seq = 12"] }
//! }"#).unwrap();
//!
//! let mut session = ProfileSession::new(1000);
//! assert!(session.push(kernel));
//!
//! let record = &session.records()[0];
//! assert_eq!(record.short_name(), "vectorized_elementwise_kernel");
//! assert_eq!(record.direction(), Some(Direction::Backward));
//! assert_eq!(record.operations(), vec!["Mul"]);
//! ```

pub mod classify;
pub mod demangle;
pub mod error;
pub mod marker;
pub mod metrics;
pub mod name;
pub mod record;
pub mod session;

pub use classify::{Attribution, Direction, MarkerSource, OpAttribution};
pub use demangle::{Demangler, PassthroughDemangler, SymbolicDemangler};
pub use error::{ClassifyError, IntegrityViolation};
pub use marker::{FrameworkMarker, MarkerError};
pub use metrics::{KernelTotals, OperationTotals, SessionSummary};
pub use record::{Classification, KernelRecord};
pub use session::{ProfileSession, SessionContext};
