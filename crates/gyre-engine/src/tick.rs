//! One engine plus everything a tick needs to publish its result.
//!
//! [`TickLoop`] is the state a [`PeriodicTask`](crate::scheduler::PeriodicTask)
//! owns while the controller is Running. A tick advances the engine,
//! and only after the update has fully returned does it capture and
//! send a snapshot, so a consumer never sees a half-updated step.

use gyre_core::{EngineGeneration, SimulationEngine, Snapshot, StepError, TickId};
use tracing::trace;

use crate::pipe::PipeSender;

/// An engine bound to its generation, tick counter, time delta and pipe.
pub struct TickLoop<E> {
    engine: E,
    generation: EngineGeneration,
    tick: TickId,
    time_delta: f64,
    pipe: PipeSender,
}

impl<E: SimulationEngine> TickLoop<E> {
    /// Bind a freshly initialized engine. The tick counter starts at 0.
    pub fn new(engine: E, generation: EngineGeneration, time_delta: f64, pipe: PipeSender) -> Self {
        Self {
            engine,
            generation,
            tick: TickId(0),
            time_delta,
            pipe,
        }
    }

    /// Capture the engine's current positions.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.generation, self.tick, self.engine.entities())
    }

    /// Send the current state through the pipe.
    pub fn publish(&self) {
        self.pipe.send(self.snapshot());
    }

    /// Advance the engine by one time delta and publish the result.
    ///
    /// An engine error is returned unmodified and nothing is published.
    pub fn step(&mut self) -> Result<(), StepError> {
        self.engine.update(self.time_delta)?;
        self.tick = self.tick.next();
        trace!(generation = %self.generation, tick = %self.tick, "tick");
        self.publish();
        Ok(())
    }

    /// The driven engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Generation of the driven engine.
    pub fn generation(&self) -> EngineGeneration {
        self.generation
    }

    /// Ticks completed on this engine.
    pub fn tick_id(&self) -> TickId {
        self.tick
    }

    /// Time delta applied on every tick.
    pub fn time_delta(&self) -> f64 {
        self.time_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::snapshot_pipe;
    use gyre_core::{ConfigError, EngineFactory};
    use gyre_model::ParticleSystemFactory;
    use gyre_test_utils::{MockEngine, MockFactory};

    #[test]
    fn step_updates_then_publishes() {
        let (tx, rx) = snapshot_pipe();
        let engine = MockFactory::new().construct(3, 10.0).unwrap();
        let mut tick_loop = TickLoop::new(engine, EngineGeneration(4), 0.25, tx);

        tick_loop.step().unwrap();
        tick_loop.step().unwrap();

        assert_eq!(tick_loop.tick_id(), TickId(2));
        assert_eq!(tick_loop.engine().updates(), &[0.25, 0.25]);
        let snap = rx.try_recv().unwrap();
        assert_eq!(snap.generation(), EngineGeneration(4));
        assert_eq!(snap.tick_id(), TickId(2));
        assert_eq!(snap.len(), 3);
    }

    #[test]
    fn failed_update_publishes_nothing() {
        let (tx, rx) = snapshot_pipe();
        let engine = MockEngine::failing_after(2, 0);
        let mut tick_loop = TickLoop::new(engine, EngineGeneration(1), 0.1, tx);
        assert!(tick_loop.step().is_err());
        assert_eq!(tick_loop.tick_id(), TickId(0));
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn drives_the_reference_model() -> Result<(), ConfigError> {
        let (tx, rx) = snapshot_pipe();
        let engine = ParticleSystemFactory::default().construct(10, 100.0)?;
        let mut tick_loop = TickLoop::new(engine, EngineGeneration(1), 0.1, tx);
        tick_loop.publish();
        let initial = rx.try_recv().unwrap();
        tick_loop.step().unwrap();
        let after = rx.try_recv().unwrap();
        assert_eq!(initial.tick_id(), TickId(0));
        assert_eq!(after.tick_id(), TickId(1));
        assert_ne!(initial.positions()[0], after.positions()[0]);
        Ok(())
    }
}
