//! Cumulative counters for a controller.

use crate::pipe::PipeStats;

/// Counters accumulated over a controller's lifetime.
///
/// Tick and deadline counts include the live task, if any.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ControlMetrics {
    /// Idle → Running transitions.
    pub plays: u64,
    /// Running → Idle transitions caused by a toggle.
    pub pauses: u64,
    /// Successful resets, including the one performed at construction.
    pub resets: u64,
    /// Tick tasks halted by an engine error.
    pub faults: u64,
    /// Ticks completed across all engines.
    pub ticks: u64,
    /// Deadlines skipped because a tick overran its period.
    pub missed_deadlines: u64,
    /// Snapshot pipe counters.
    pub pipe: PipeStats,
}
