//! Test utilities and mock types for Gyre development.
//!
//! Provides a scriptable [`MockEngine`] and [`MockFactory`] implementing
//! the engine seam, a [`TickGate`] for holding a tick in flight, and a
//! [`RecordingConsumer`] that keeps every delivered snapshot.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    tick_gate, GateControl, MockEngine, MockFactory, RecordingConsumer, SnapshotLog, TickGate,
};
