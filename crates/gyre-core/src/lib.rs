//! Core types and traits for the Gyre simulation dashboard.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Gyre workspace:
//! identifiers, entity and snapshot types, run parameters, error types,
//! and the traits at the engine and consumer seams.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod entity;
pub mod error;
pub mod id;
pub mod params;
pub mod snapshot;
pub mod traits;

pub use entity::{Entity, Position};
pub use error::{ConfigError, StepError};
pub use id::{EngineGeneration, TickId};
pub use params::{ParamLimits, ParamRange, RunParams};
pub use snapshot::Snapshot;
pub use traits::{EngineFactory, SimulationEngine, SnapshotConsumer};
