//! Write-only telemetry.
//!
//! A [`Snapshot`] of scheduler and axis state is built every
//! `telemetry_interval` cycles and handed to a [`TelemetrySink`]. Sinks are
//! best-effort: nothing published is ever read back by the control path.

use std::sync::Arc;

use hoist_common::superstructure::state::SuperstructureState;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::axis::profiled::ProfiledAxis;

/// Ring capacity of [`MemorySink`].
pub const MEMORY_SINK_CAPACITY: usize = 64;

/// Axis values published each snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisSnapshot {
    pub position: f64,
    pub velocity: f64,
    pub goal: f64,
    pub setpoint_position: f64,
    pub setpoint_velocity: f64,
    pub at_goal: bool,
    pub should_estop: bool,
    pub running: bool,
}

impl AxisSnapshot {
    pub fn of(axis: &ProfiledAxis) -> Self {
        let sp = axis.setpoint();
        Self {
            position: axis.position(),
            velocity: axis.velocity(),
            goal: axis.goal(),
            setpoint_position: sp.position,
            setpoint_velocity: sp.velocity,
            at_goal: axis.at_goal(),
            should_estop: axis.should_estop(),
            running: axis.is_running(),
        }
    }
}

/// One telemetry record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snapshot {
    pub cycle: u64,
    pub current: SuperstructureState,
    pub next: Option<SuperstructureState>,
    pub goal: SuperstructureState,
    /// `(from, to)` of the running edge.
    pub active_edge: Option<(SuperstructureState, SuperstructureState)>,
    pub estopped: bool,
    /// Raw `Advisory` bits.
    pub advisories: u16,
    pub has_coral: bool,
    pub has_algae: bool,
    pub elevator: AxisSnapshot,
    pub pivot: AxisSnapshot,
}

/// Destination for snapshots.
pub trait TelemetrySink: Send {
    fn publish(&mut self, snapshot: &Snapshot);
}

/// Logs each snapshot as JSON at debug level.
#[derive(Debug, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn publish(&mut self, snapshot: &Snapshot) {
        match serde_json::to_string(snapshot) {
            Ok(json) => debug!(target: "hoist::telemetry", "{json}"),
            Err(e) => warn!("Telemetry serialization failed: {e}"),
        }
    }
}

/// Keeps the most recent snapshots in a fixed ring, for tests and tools.
#[derive(Clone, Default)]
pub struct MemorySink {
    ring: Arc<Mutex<heapless::Deque<Snapshot, MEMORY_SINK_CAPACITY>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest snapshot, if any.
    pub fn latest(&self) -> Option<Snapshot> {
        self.ring.lock().back().copied()
    }

    /// All retained snapshots, oldest first.
    pub fn drain(&self) -> Vec<Snapshot> {
        let mut ring = self.ring.lock();
        let mut out = Vec::with_capacity(ring.len());
        while let Some(s) = ring.pop_front() {
            out.push(s);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.ring.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.lock().is_empty()
    }
}

impl TelemetrySink for MemorySink {
    fn publish(&mut self, snapshot: &Snapshot) {
        let mut ring = self.ring.lock();
        if ring.is_full() {
            ring.pop_front();
        }
        let _ = ring.push_back(*snapshot);
    }
}

/// Throttles snapshots to one every `interval` cycles.
pub struct Telemetry {
    sink: Box<dyn TelemetrySink>,
    interval: u32,
    countdown: u32,
}

impl Telemetry {
    pub fn new(sink: Box<dyn TelemetrySink>, interval: u32) -> Self {
        Self {
            sink,
            interval: interval.max(1),
            countdown: 0,
        }
    }

    /// Publish `build()` if this cycle is due. The first call always is.
    pub fn tick(&mut self, build: impl FnOnce() -> Snapshot) {
        if self.countdown == 0 {
            self.sink.publish(&build());
            self.countdown = self.interval;
        }
        self.countdown -= 1;
    }

    pub fn set_sink(&mut self, sink: Box<dyn TelemetrySink>) {
        self.sink = sink;
    }
}
