//! Kernel record model
//!
//! A [`KernelRecord`] holds one GPU kernel launch: device timing and
//! placement, the host call that issued it, the markers open at launch time,
//! and the classification derived from those markers.
//!
//! Records are built in one go by [`KernelRecord::ingest`], which applies the
//! launch, runtime and marker steps in that order, and are finished by
//! [`KernelRecord::classify`]. Fields are read-only afterwards.

use kernscope_shared::{
    CorrelationId, Dim3, LaunchInfo, MarkerInfo, Pid, RuntimeInfo, Tid, Timestamp,
};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::debug;

use crate::classify::{self, Attribution, Direction};
use crate::demangle::Demangler;
use crate::error::{ClassifyError, IntegrityViolation, Result};
use crate::name::KernelName;
use crate::session::SessionContext;

/// Derived classification state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub direction: Direction,
    pub attribution: Attribution,
}

/// One GPU kernel launch and its classification
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KernelRecord {
    name_id: u64,
    correlation_id: CorrelationId,

    kernel_start: Timestamp,
    kernel_end: Timestamp,
    kernel_duration: u64,

    runtime_start: Timestamp,
    runtime_end: Timestamp,
    runtime_duration: u64,

    device: u32,
    stream: u32,
    grid: Dim3,
    block: Dim3,

    pid: Pid,
    tid: Tid,
    obj_id: u64,

    long_name: String,
    short_name: String,

    markers: MarkerInfo,
    sub_seq_id: u32,
    time_offset: Timestamp,

    classification: Option<Classification>,
}

impl KernelRecord {
    /// Build a record from the three ingestion inputs
    ///
    /// Fails with [`ClassifyError::DataIntegrity`] when the timestamps
    /// contradict each other or the session's profiling start.
    pub fn ingest(
        ctx: &SessionContext,
        launch: &LaunchInfo,
        runtime: &RuntimeInfo,
        markers: MarkerInfo,
        demangler: &dyn Demangler,
    ) -> Result<Self> {
        let mut record = KernelRecord::default();
        record.ingest_launch(ctx, launch, demangler)?;
        record.ingest_runtime(runtime)?;
        record.ingest_markers(markers);
        Ok(record)
    }

    fn ingest_launch(
        &mut self,
        ctx: &SessionContext,
        info: &LaunchInfo,
        demangler: &dyn Demangler,
    ) -> Result<()> {
        let integrity = |violation| ClassifyError::DataIntegrity {
            correlation_id: info.correlation_id,
            violation,
        };

        if info.end <= info.start {
            return Err(integrity(IntegrityViolation::EmptyKernelInterval {
                start: info.start,
                end: info.end,
            }));
        }
        if info.start <= ctx.profiling_start {
            return Err(integrity(IntegrityViolation::StartsBeforeProfiling {
                start: info.start,
                profiling_start: ctx.profiling_start,
            }));
        }

        self.name_id = info.name_id;
        self.correlation_id = info.correlation_id;
        self.kernel_start = info.start;
        self.kernel_end = info.end;
        self.kernel_duration = info.end - info.start;
        self.device = info.device_id;
        self.stream = info.stream_id;
        self.grid = info.grid();
        self.block = info.block();
        self.time_offset = ctx.profiling_start;

        let name = KernelName::from_demangled(demangler.demangle(&info.name));
        self.long_name = name.long;
        self.short_name = name.short;
        Ok(())
    }

    fn ingest_runtime(&mut self, info: &RuntimeInfo) -> Result<()> {
        let integrity = |violation| ClassifyError::DataIntegrity {
            correlation_id: self.correlation_id,
            violation,
        };

        if info.r_start >= info.r_end {
            return Err(integrity(IntegrityViolation::EmptyRuntimeInterval {
                r_start: info.r_start,
                r_end: info.r_end,
            }));
        }
        if info.r_start >= self.kernel_start {
            return Err(integrity(IntegrityViolation::LaunchAfterKernel {
                r_start: info.r_start,
                kernel_start: self.kernel_start,
            }));
        }

        self.runtime_start = info.r_start;
        self.runtime_end = info.r_end;
        self.runtime_duration = info.r_end - info.r_start;
        self.pid = info.pid;
        self.tid = info.tid;
        self.obj_id = info.obj_id;
        Ok(())
    }

    fn ingest_markers(&mut self, markers: MarkerInfo) {
        self.markers = markers;
        self.sub_seq_id = 0;
    }

    /// Training direction implied by the sequence markers
    pub fn derive_direction(&self) -> Direction {
        classify::derive_direction(&self.markers.seq_markers)
    }

    /// Module/operation attribution implied by the markers
    pub fn derive_classification(&self) -> Result<Attribution> {
        classify::derive_classification(self.correlation_id, &self.markers)
    }

    /// Derive and store direction and attribution, consuming the ingested record
    pub fn classify(mut self) -> Result<Self> {
        let direction = self.derive_direction();
        let attribution = self.derive_classification()?;
        debug!(
            "Kernel {} (correlation id {}) classified as {} {}",
            self.short_name,
            self.correlation_id,
            direction,
            attribution.label()
        );
        self.classification = Some(Classification {
            direction,
            attribution,
        });
        Ok(self)
    }

    pub fn name_id(&self) -> u64 {
        self.name_id
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub fn kernel_start(&self) -> Timestamp {
        self.kernel_start
    }

    pub fn kernel_end(&self) -> Timestamp {
        self.kernel_end
    }

    /// Silicon time in nanoseconds
    pub fn kernel_duration(&self) -> u64 {
        self.kernel_duration
    }

    pub fn runtime_start(&self) -> Timestamp {
        self.runtime_start
    }

    pub fn runtime_end(&self) -> Timestamp {
        self.runtime_end
    }

    pub fn runtime_duration(&self) -> u64 {
        self.runtime_duration
    }

    pub fn device(&self) -> u32 {
        self.device
    }

    pub fn stream(&self) -> u32 {
        self.stream
    }

    pub fn grid(&self) -> Dim3 {
        self.grid
    }

    pub fn block(&self) -> Dim3 {
        self.block
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn tid(&self) -> Tid {
        self.tid
    }

    pub fn obj_id(&self) -> u64 {
        self.obj_id
    }

    /// Demangled name with template arguments intact
    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    /// Display name, see [`crate::name::shorten`]
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn markers(&self) -> &MarkerInfo {
        &self.markers
    }

    pub fn layer_markers(&self) -> &[String] {
        &self.markers.layer_markers
    }

    pub fn trace_markers(&self) -> &[String] {
        &self.markers.trace_markers
    }

    pub fn repr_markers(&self) -> &[String] {
        &self.markers.repr_markers
    }

    pub fn seq_markers(&self) -> &[String] {
        &self.markers.seq_markers
    }

    pub fn other_markers(&self) -> &[String] {
        &self.markers.other_markers
    }

    pub fn alt_markers(&self) -> &[String] {
        &self.markers.alt_markers
    }

    pub fn seq_id(&self) -> &[i64] {
        &self.markers.seq_id
    }

    pub fn alt_seq_id(&self) -> &[i64] {
        &self.markers.alt_seq_id
    }

    pub fn layer(&self) -> &[String] {
        &self.markers.layer
    }

    pub fn sub_seq_id(&self) -> u32 {
        self.sub_seq_id
    }

    /// Profiling start the record was ingested against
    pub fn time_offset(&self) -> Timestamp {
        self.time_offset
    }

    pub fn classification(&self) -> Option<&Classification> {
        self.classification.as_ref()
    }

    pub fn is_classified(&self) -> bool {
        self.classification.is_some()
    }

    pub fn direction(&self) -> Option<Direction> {
        self.classification.as_ref().map(|c| c.direction)
    }

    pub fn attribution(&self) -> Option<&Attribution> {
        self.classification.as_ref().map(|c| &c.attribution)
    }

    /// Module list, empty until classified
    pub fn modules(&self) -> Vec<&str> {
        self.attribution().map(Attribution::modules).unwrap_or_default()
    }

    /// Operation list, empty until classified
    pub fn operations(&self) -> Vec<&str> {
        self.attribution()
            .map(Attribution::operations)
            .unwrap_or_default()
    }
}

impl Serialize for KernelRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("KernelRecord", 30)?;
        s.serialize_field("nameId", &self.name_id)?;
        s.serialize_field("correlationId", &self.correlation_id)?;
        s.serialize_field("kShortName", &self.short_name)?;
        s.serialize_field("kLongName", &self.long_name)?;
        s.serialize_field("kStart", &self.kernel_start)?;
        s.serialize_field("kEnd", &self.kernel_end)?;
        s.serialize_field("kDuration", &self.kernel_duration)?;
        s.serialize_field("rStart", &self.runtime_start)?;
        s.serialize_field("rEnd", &self.runtime_end)?;
        s.serialize_field("rDuration", &self.runtime_duration)?;
        s.serialize_field("timeOffset", &self.time_offset)?;
        s.serialize_field("device", &self.device)?;
        s.serialize_field("stream", &self.stream)?;
        s.serialize_field("grid", &self.grid)?;
        s.serialize_field("block", &self.block)?;
        s.serialize_field("pid", &self.pid)?;
        s.serialize_field("tid", &self.tid)?;
        s.serialize_field("objId", &self.obj_id)?;
        s.serialize_field("layer", &self.markers.layer)?;
        s.serialize_field("trace", &self.markers.trace_markers)?;
        s.serialize_field("reprMarkers", &self.markers.repr_markers)?;
        s.serialize_field("marker", &self.markers.framework_markers)?;
        s.serialize_field("seqMarker", &self.markers.seq_markers)?;
        s.serialize_field("seqId", &self.markers.seq_id)?;
        s.serialize_field("subSeqId", &self.sub_seq_id)?;
        s.serialize_field("altSeqId", &self.markers.alt_seq_id)?;
        s.serialize_field("dir", &self.direction())?;
        s.serialize_field("mod", &self.modules())?;
        s.serialize_field("op", &self.operations())?;
        s.end()
    }
}
