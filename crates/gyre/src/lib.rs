//! Gyre: a play/pause/reset control loop around a time-stepped particle model.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Gyre sub-crates, plus a character-cell scatter plot for viewing
//! snapshots in a terminal.
//!
//! # Quick start
//!
//! ```rust
//! use gyre::prelude::*;
//!
//! let (tx, rx) = snapshot_pipe();
//! let params = RunParams { particle_count: 4, bounds: 10.0, time_delta: 0.1 };
//! let mut controller =
//!     Controller::new(ParticleSystemFactory::default(), params, &ControllerConfig::default(), tx)
//!         .unwrap();
//!
//! // Construction publishes the first snapshot.
//! let first = rx.try_recv().unwrap();
//! assert_eq!(first.len(), 4);
//!
//! assert_eq!(controller.play_or_pause().unwrap(), ControlState::Running);
//! assert_eq!(controller.reset().unwrap(), ControlState::Idle);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `gyre-core` | IDs, entities, snapshots, parameters, errors, traits |
//! | [`model`] | `gyre-model` | Reference gravitational particle system |
//! | [`engine`] | `gyre-engine` | Scheduler, pipe, controller, dashboard runtime |
//! | [`plot`] | this crate | Scatter-plot rendering and terminal consumer |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod plot;

/// Core types, traits, and IDs (`gyre-core`).
pub use gyre_core as types;

/// Reference particle system (`gyre-model`).
///
/// [`model::ParticleSystem`] and its factory
/// [`model::ParticleSystemFactory`].
pub use gyre_model as model;

/// Control loop (`gyre-engine`).
///
/// [`engine::Controller`] for direct ownership, [`engine::Dashboard`] for
/// a controller on its own thread.
pub use gyre_engine as engine;

/// Common imports for typical Gyre usage.
pub mod prelude {
    // Core types and traits
    pub use gyre_core::{
        EngineFactory, EngineGeneration, Entity, Position, RunParams, SimulationEngine, Snapshot,
        SnapshotConsumer, TickId,
    };

    // Errors
    pub use gyre_core::{ConfigError, StepError};

    // Model
    pub use gyre_model::{ParticleSystem, ParticleSystemFactory};

    // Engine
    pub use gyre_engine::{
        snapshot_pipe, ControlError, ControlEvent, ControlState, Controller, ControllerConfig,
        Dashboard, DashboardConfig,
    };

    // Plot
    pub use crate::plot::{Frame, ScatterPlot, SharedBounds, TerminalView};
}
