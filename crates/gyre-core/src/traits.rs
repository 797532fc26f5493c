//! Traits at the engine and consumer seams.

use crate::entity::Entity;
use crate::error::{ConfigError, StepError};
use crate::snapshot::Snapshot;

/// A time-stepped simulation that owns its entity state.
///
/// The control loop never calls two methods concurrently on the same
/// engine: `&mut self` on [`update`](Self::update) and ownership hand-off
/// between the controller and the tick thread enforce that. Engines
/// must be [`Send`] because a running engine lives on the tick thread.
pub trait SimulationEngine: Send {
    /// Advance every entity by `dt`.
    ///
    /// An error aborts the current tick and halts the task that issued
    /// it; the engine is left in whatever state the failure produced.
    fn update(&mut self, dt: f64) -> Result<(), StepError>;

    /// Ordered, read-only view of the current entities.
    fn entities(&self) -> &[Entity];

    /// Writable view of the entities.
    ///
    /// Only used right after construction to initialize velocities.
    fn entities_mut(&mut self) -> &mut [Entity];
}

/// Builds engines for a reset.
pub trait EngineFactory: Send {
    /// The engine type this factory produces.
    type Engine: SimulationEngine + 'static;

    /// Construct an engine with `particle_count` entities placed in
    /// `[-bounds, bounds]` on each axis.
    ///
    /// Must fail with [`ConfigError::InvalidParticleCount`] when
    /// `particle_count == 0`.
    fn construct(&self, particle_count: usize, bounds: f64) -> Result<Self::Engine, ConfigError>;
}

/// Receives snapshots delivered by a pipe subscription.
///
/// Invoked at whatever rate the consumer keeps up with; intermediate
/// snapshots may be skipped. Never invoked concurrently with itself.
pub trait SnapshotConsumer: Send {
    /// Handle the most recent snapshot.
    fn consume(&mut self, snapshot: &Snapshot);
}

impl<F> SnapshotConsumer for F
where
    F: FnMut(&Snapshot) + Send,
{
    fn consume(&mut self, snapshot: &Snapshot) {
        self(snapshot)
    }
}
