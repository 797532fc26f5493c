//! Integration test: controller scenarios against mock and reference engines.
//!
//! Covers the reset-during-tick ordering guarantee, post-reset entity
//! counts and velocities, and the play/pause toggle lifecycle.

use std::thread;
use std::time::{Duration, Instant};

use gyre_core::{EngineGeneration, RunParams, SimulationEngine, TickId};
use gyre_engine::{snapshot_pipe, ControlState, Controller, ControllerConfig, ORIGIN_EPSILON};
use gyre_model::ParticleSystemFactory;
use gyre_test_utils::{tick_gate, MockFactory};

fn config(tick_rate_hz: f64) -> ControllerConfig {
    ControllerConfig {
        tick_rate_hz,
        ..ControllerConfig::default()
    }
}

fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        if Instant::now() > deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }
    true
}

// ── Reset racing a tick ──────────────────────────────────────────────

#[test]
fn reset_waits_for_in_flight_tick_then_publishes_new_engine() {
    let factory = MockFactory::new();
    let (gate, control) = tick_gate();
    factory.gate_next(gate);

    let (tx, rx) = snapshot_pipe();
    let mut controller =
        Controller::new(factory.clone(), RunParams::default(), &config(20.0), tx).unwrap();
    assert_eq!(rx.try_recv().unwrap().generation(), EngineGeneration(1));

    controller.play_or_pause().unwrap();
    assert!(control.wait_entered(Duration::from_secs(5)), "tick never started");

    let result = thread::scope(|s| {
        let resetting = s.spawn(|| controller.reset());
        // Let the reset block on the in-flight tick before releasing it.
        thread::sleep(Duration::from_millis(50));
        assert!(!resetting.is_finished());
        control.release();
        resetting.join().unwrap()
    });

    assert_eq!(result, Ok(ControlState::Idle));
    // The in-flight tick completed against the old engine.
    assert_eq!(factory.updates_of(0), 1);
    assert_eq!(factory.constructed(), 2);

    // Its snapshot was sent before the new engine's initial one, so the
    // latest value is the new engine's.
    let latest = rx.try_recv().unwrap();
    assert_eq!(latest.generation(), EngineGeneration(2));
    assert_eq!(latest.tick_id(), TickId(0));
    let stats = rx.stats();
    assert_eq!(stats.sent, 3);
    assert_eq!(stats.superseded, 1);
}

// ── Reset contents ───────────────────────────────────────────────────

#[test]
fn four_particles_in_bounds_ten_have_defined_velocities() {
    let params = RunParams {
        particle_count: 4,
        bounds: 10.0,
        time_delta: 0.1,
    };
    let (tx, rx) = snapshot_pipe();
    let controller =
        Controller::new(ParticleSystemFactory::default(), params, &config(30.0), tx).unwrap();

    let snap = rx.try_recv().unwrap();
    assert_eq!(snap.len(), 4);
    for p in snap.positions() {
        assert!((-10.0..=10.0).contains(&p.x), "x out of bounds: {}", p.x);
        assert!((-10.0..=10.0).contains(&p.y), "y out of bounds: {}", p.y);
    }

    let engine = controller.idle_engine().unwrap();
    for e in engine.entities() {
        let r = e.x.hypot(e.y);
        if r > ORIGIN_EPSILON {
            assert!((e.vx - -e.y / r).abs() < 1e-12);
            assert!((e.vy - e.x / r).abs() < 1e-12);
            assert!((e.speed() - 1.0).abs() < 1e-9);
        } else {
            assert_eq!((e.vx, e.vy), (0.0, 0.0));
        }
    }
}

#[test]
fn reset_snapshot_has_configured_entity_count() {
    let (tx, rx) = snapshot_pipe();
    let mut controller =
        Controller::new(ParticleSystemFactory::default(), RunParams::default(), &config(30.0), tx)
            .unwrap();
    for count in [1, 2, 37, 250] {
        controller.set_particle_count(count).unwrap();
        controller.reset().unwrap();
        let snap = rx.try_recv().unwrap();
        assert_eq!(snap.len(), count);
        assert_eq!(snap.tick_id(), TickId(0));
        assert_eq!(snap.generation(), controller.generation());
    }
}

// ── Play / pause ─────────────────────────────────────────────────────

#[test]
fn play_pause_lifecycle_stops_ticks() {
    let factory = MockFactory::new();
    let (tx, rx) = snapshot_pipe();
    let mut controller =
        Controller::new(factory.clone(), RunParams::default(), &config(250.0), tx).unwrap();
    assert_eq!(controller.state(), ControlState::Idle);
    assert!(!controller.has_task());

    assert_eq!(controller.play_or_pause(), Ok(ControlState::Running));
    assert!(controller.has_task());
    assert!(wait_until(|| factory.updates_of(0) >= 3));
    let during = rx.recv_timeout(Duration::from_secs(1)).unwrap();
    assert!(during.tick_id() > TickId(0));

    assert_eq!(controller.play_or_pause(), Ok(ControlState::Idle));
    assert!(!controller.has_task());
    let frozen = factory.updates_of(0);
    let sent = rx.stats().sent;
    thread::sleep(Duration::from_millis(40));
    assert_eq!(factory.updates_of(0), frozen);
    assert_eq!(rx.stats().sent, sent);

    let metrics = controller.metrics();
    assert_eq!((metrics.plays, metrics.pauses), (1, 1));
    assert_eq!(metrics.ticks, frozen);
}

#[test]
fn reference_model_runs_and_pauses_cleanly() {
    let (tx, rx) = snapshot_pipe();
    let mut controller =
        Controller::new(ParticleSystemFactory::default(), RunParams::default(), &config(200.0), tx)
            .unwrap();
    let initial = rx.try_recv().unwrap();

    controller.play_or_pause().unwrap();
    let moved = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    controller.play_or_pause().unwrap();

    assert_eq!(moved.generation(), initial.generation());
    assert!(moved.tick_id() >= TickId(1));
    assert_ne!(moved.positions(), initial.positions());
    assert!(controller.take_fault().is_none());
}
