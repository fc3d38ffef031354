//! Kernel launch record definitions
//!
//! These types represent one GPU kernel launch as delivered by the trace
//! decoder: the device-side activity, the host-side runtime call that issued
//! it, and the instrumentation markers active at launch time.

use serde::{Deserialize, Serialize};

use crate::types::markers::MarkerInfo;

/// Timestamp in nanoseconds on the profiler clock
pub type Timestamp = u64;

/// Correlation id linking a GPU kernel to the CPU call that launched it
pub type CorrelationId = u64;

/// Process ID
pub type Pid = u64;

/// Thread ID
pub type Tid = u64;

/// Grid or block extent of a launch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dim3 {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Dim3 {
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }
}

impl std::fmt::Display for Dim3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}

/// Device-side kernel activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchInfo {
    /// Symbol table id of the (mangled) kernel name
    pub name_id: u64,

    pub correlation_id: CorrelationId,

    /// GPU start time
    pub start: Timestamp,

    /// GPU end time
    pub end: Timestamp,

    pub device_id: u32,
    pub stream_id: u32,

    pub grid_x: u32,
    pub grid_y: u32,
    pub grid_z: u32,

    pub block_x: u32,
    pub block_y: u32,
    pub block_z: u32,

    /// Kernel symbol, possibly mangled
    pub name: String,
}

impl LaunchInfo {
    pub fn grid(&self) -> Dim3 {
        Dim3::new(self.grid_x, self.grid_y, self.grid_z)
    }

    pub fn block(&self) -> Dim3 {
        Dim3::new(self.block_x, self.block_y, self.block_z)
    }
}

/// Host-side runtime call that issued the launch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeInfo {
    /// CPU start time of the launching call
    pub r_start: Timestamp,

    /// CPU end time of the launching call
    pub r_end: Timestamp,

    pub pid: Pid,
    pub tid: Tid,
    pub obj_id: u64,
}

/// One kernel launch as read from a decoded trace
///
/// On the wire the launch and runtime fields sit flat at the top level and
/// the markers are nested under `markers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceKernel {
    #[serde(flatten)]
    pub launch: LaunchInfo,

    #[serde(flatten)]
    pub runtime: RuntimeInfo,

    #[serde(default)]
    pub markers: MarkerInfo,
}
