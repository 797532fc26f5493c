//! Reusable engine and consumer fixtures.
//!
//! - [`MockEngine`] — moves every entity `+dt` along x per update,
//!   records each dt, optionally fails after N updates or blocks on a
//!   [`TickGate`].
//! - [`MockFactory`] — builds mock engines on a deterministic ring with
//!   the last entity at the origin; cloneable so a test can keep a probe
//!   after handing the factory to a controller.
//! - [`RecordingConsumer`] — stores every snapshot it is given.

use std::f64::consts::TAU;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use gyre_core::{ConfigError, EngineFactory, Entity, SimulationEngine, Snapshot, SnapshotConsumer, StepError};

// ── TickGate ───────────────────────────────────────────────────────

/// Engine side of a gate: announces entry to an update, then blocks
/// until released.
pub struct TickGate {
    entered: Sender<()>,
    release: Receiver<()>,
}

impl TickGate {
    fn enter_and_wait(&self) {
        let _ = self.entered.send(());
        // A dropped GateControl releases every waiter.
        let _ = self.release.recv();
    }
}

/// Test side of a gate.
pub struct GateControl {
    entered: Receiver<()>,
    release: Sender<()>,
}

impl GateControl {
    /// Wait until an update has entered the gate.
    pub fn wait_entered(&self, timeout: Duration) -> bool {
        self.entered.recv_timeout(timeout).is_ok()
    }

    /// Let one waiting (or future) update through.
    pub fn release(&self) {
        let _ = self.release.send(());
    }
}

/// Create a connected gate pair.
pub fn tick_gate() -> (TickGate, GateControl) {
    let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
    let (release_tx, release_rx) = crossbeam_channel::unbounded();
    (
        TickGate {
            entered: entered_tx,
            release: release_rx,
        },
        GateControl {
            entered: entered_rx,
            release: release_tx,
        },
    )
}

// ── MockEngine ─────────────────────────────────────────────────────

pub struct MockEngine {
    entities: Vec<Entity>,
    updates: Vec<f64>,
    fail_after: Option<usize>,
    panic_next: bool,
    gate: Option<TickGate>,
    update_count: Arc<AtomicU64>,
}

impl MockEngine {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self {
            entities,
            updates: Vec::new(),
            fail_after: None,
            panic_next: false,
            gate: None,
            update_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// `count` entities at rest; the update after `ok_updates` successful
    /// ones fails.
    pub fn failing_after(count: usize, ok_updates: usize) -> Self {
        Self {
            fail_after: Some(ok_updates),
            ..Self::new(vec![Entity::default(); count])
        }
    }

    /// Block every update on `gate`.
    pub fn with_gate(mut self, gate: TickGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Every dt passed to a successful update, in order.
    pub fn updates(&self) -> &[f64] {
        &self.updates
    }

    /// Shared counter of successful updates, readable after the engine
    /// has moved to another thread.
    pub fn update_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.update_count)
    }
}

impl SimulationEngine for MockEngine {
    fn update(&mut self, dt: f64) -> Result<(), StepError> {
        if let Some(gate) = &self.gate {
            gate.enter_and_wait();
        }
        if self.panic_next {
            panic!("scripted panic");
        }
        if self.fail_after == Some(self.updates.len()) {
            return Err(StepError::EngineFailed {
                reason: "scripted failure".into(),
            });
        }
        for e in &mut self.entities {
            e.x += dt;
        }
        self.updates.push(dt);
        self.update_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }
}

// ── MockFactory ────────────────────────────────────────────────────

#[derive(Default)]
struct FactoryState {
    fail_after: Option<usize>,
    panic_next: bool,
    next_gate: Option<TickGate>,
    rejecting: bool,
    counters: Vec<Arc<AtomicU64>>,
}

#[derive(Clone, Default)]
pub struct MockFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engines built from now on fail after `ok_updates` updates.
    pub fn failing_after(self, ok_updates: usize) -> Self {
        self.state.lock().unwrap().fail_after = Some(ok_updates);
        self
    }

    /// The next engine built panics on its first update.
    pub fn panic_next(&self) {
        self.state.lock().unwrap().panic_next = true;
    }

    /// The next engine built blocks every update on `gate`.
    pub fn gate_next(&self, gate: TickGate) {
        self.state.lock().unwrap().next_gate = Some(gate);
    }

    /// Make `construct` fail until switched back.
    pub fn set_rejecting(&self, rejecting: bool) {
        self.state.lock().unwrap().rejecting = rejecting;
    }

    /// Number of engines built so far.
    pub fn constructed(&self) -> usize {
        self.state.lock().unwrap().counters.len()
    }

    /// Successful updates performed by the `index`-th engine built.
    pub fn updates_of(&self, index: usize) -> u64 {
        self.state.lock().unwrap().counters[index].load(Ordering::SeqCst)
    }

    /// Deterministic placement: `count - 1` entities evenly spaced on a
    /// circle of radius `bounds / 2`, then one at the origin.
    pub fn positions(count: usize, bounds: f64) -> Vec<Entity> {
        let ring = count.saturating_sub(1);
        let mut entities: Vec<Entity> = (0..ring)
            .map(|i| {
                let theta = TAU * i as f64 / ring as f64;
                Entity::at(0.5 * bounds * theta.cos(), 0.5 * bounds * theta.sin())
            })
            .collect();
        if count > 0 {
            entities.push(Entity::at(0.0, 0.0));
        }
        entities
    }
}

impl EngineFactory for MockFactory {
    type Engine = MockEngine;

    fn construct(&self, particle_count: usize, bounds: f64) -> Result<MockEngine, ConfigError> {
        if particle_count == 0 {
            return Err(ConfigError::InvalidParticleCount {
                value: particle_count,
            });
        }
        let mut state = self.state.lock().unwrap();
        if state.rejecting {
            return Err(ConfigError::InvalidBounds { value: bounds });
        }
        let mut engine = MockEngine::new(Self::positions(particle_count, bounds));
        engine.fail_after = state.fail_after;
        engine.panic_next = std::mem::take(&mut state.panic_next);
        engine.gate = state.next_gate.take();
        state.counters.push(engine.update_counter());
        Ok(engine)
    }
}

// ── RecordingConsumer ──────────────────────────────────────────────

/// Shared view of everything a [`RecordingConsumer`] received.
#[derive(Clone, Default)]
pub struct SnapshotLog {
    seen: Arc<Mutex<Vec<Snapshot>>>,
}

impl SnapshotLog {
    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.seen.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last(&self) -> Option<Snapshot> {
        self.seen.lock().unwrap().last().cloned()
    }

    /// Poll until `pred` holds for the latest snapshot or `timeout` passes.
    pub fn wait_for_last(&self, timeout: Duration, mut pred: impl FnMut(&Snapshot) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.last().is_some_and(|s| pred(&s)) {
                return true;
            }
            if Instant::now() > deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
    }
}

pub struct RecordingConsumer {
    log: SnapshotLog,
}

impl RecordingConsumer {
    pub fn pair() -> (Self, SnapshotLog) {
        let log = SnapshotLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl SnapshotConsumer for RecordingConsumer {
    fn consume(&mut self, snapshot: &Snapshot) {
        self.log.seen.lock().unwrap().push(snapshot.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_places_last_entity_at_origin_within_bounds() {
        let engine = MockFactory::new().construct(4, 10.0).unwrap();
        let entities = engine.entities();
        assert_eq!(entities.len(), 4);
        assert_eq!(entities[3], Entity::at(0.0, 0.0));
        for e in entities {
            assert!(e.x.abs() <= 10.0 && e.y.abs() <= 10.0);
        }
    }

    #[test]
    fn failing_engine_fails_on_schedule() {
        let mut engine = MockEngine::failing_after(1, 2);
        engine.update(0.1).unwrap();
        engine.update(0.1).unwrap();
        assert!(engine.update(0.1).is_err());
        assert_eq!(engine.updates().len(), 2);
    }

    #[test]
    fn factory_tracks_update_counts() {
        let factory = MockFactory::new();
        let mut engine = factory.construct(2, 5.0).unwrap();
        engine.update(0.5).unwrap();
        assert_eq!(factory.constructed(), 1);
        assert_eq!(factory.updates_of(0), 1);
    }
}
