//! Control loop driving a time-stepped simulation engine.
//!
//! Provides the fixed-period [`PeriodicTask`] scheduler, the single-slot
//! last-write-wins snapshot pipe, engine bootstrap, and the
//! play/pause/reset [`Controller`]. [`Dashboard`] hosts a controller on
//! its own thread behind a command channel.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bootstrap;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod metrics;
pub mod pipe;
pub mod scheduler;
pub mod tick;

pub use bootstrap::{assign_orbital_velocities, build_engine, ORIGIN_EPSILON};
pub use config::{ControllerConfig, DashboardConfig};
pub use controller::{ControlError, ControlEvent, ControlState, Controller};
pub use dashboard::{
    Dashboard, DashboardError, DashboardHandle, DashboardStatus, ShutdownReport, SubmitError,
};
pub use metrics::ControlMetrics;
pub use pipe::{
    snapshot_pipe, PipeClosed, PipeReceiver, PipeSender, PipeStats, RecvTimeoutError,
    Subscription,
};
pub use scheduler::{PeriodicTask, StartError, TaskExit};
pub use tick::TickLoop;
