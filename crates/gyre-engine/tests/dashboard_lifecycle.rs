//! Integration test: dashboard runtime lifecycle.
//!
//! Runs the reference particle model behind a [`Dashboard`], checks what
//! the consumer sees across play, pause and reset, and that commands
//! from several threads are serialized.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use gyre_core::{EngineGeneration, RunParams, Snapshot, TickId};
use gyre_engine::{ControlState, ControllerConfig, Dashboard, DashboardConfig};
use gyre_model::ParticleSystemFactory;
use gyre_test_utils::{MockFactory, RecordingConsumer};

fn config(tick_rate_hz: f64) -> DashboardConfig {
    DashboardConfig {
        controller: ControllerConfig {
            tick_rate_hz,
            ..ControllerConfig::default()
        },
        fault_poll_ms: 5,
        ..DashboardConfig::default()
    }
}

#[test]
fn consumer_sees_play_pause_and_reset() {
    let (consumer, log) = RecordingConsumer::pair();
    let params = RunParams {
        particle_count: 20,
        ..RunParams::default()
    };
    let mut dash =
        Dashboard::spawn(ParticleSystemFactory::default(), params, config(120.0), consumer)
            .unwrap();
    let patience = Duration::from_secs(5);

    assert!(log.wait_for_last(patience, |s| s.generation() == EngineGeneration(1)));

    dash.play_or_pause().unwrap();
    assert!(log.wait_for_last(patience, |s| s.tick_id() >= TickId(3)));
    dash.play_or_pause().unwrap();

    dash.set_particle_count(8).unwrap();
    assert_eq!(dash.reset(), Ok(ControlState::Idle));
    assert!(log.wait_for_last(patience, |s| {
        s.generation() == EngineGeneration(2) && s.tick_id() == TickId(0)
    }));
    assert_eq!(log.last().unwrap().len(), 8);

    // Deliveries within one generation arrive in tick order.
    let seen = log.snapshots();
    for pair in seen.windows(2) {
        if pair[0].generation() == pair[1].generation() {
            assert!(pair[0].tick_id() < pair[1].tick_id());
        } else {
            assert!(pair[0].generation() < pair[1].generation());
        }
    }

    let report = dash.shutdown();
    assert!(report.control_joined);
    assert!(report.delivery_joined);
    let status = report.final_status.unwrap();
    assert_eq!(status.metrics.resets, 2);
    assert_eq!(status.metrics.plays, 1);
    assert!(status.metrics.pipe.delivered <= status.metrics.pipe.sent);
}

#[test]
fn closure_consumer_and_drop_shutdown() {
    let latest: Arc<Mutex<Option<Snapshot>>> = Arc::default();
    let sink = Arc::clone(&latest);
    let consumer = move |snapshot: &Snapshot| {
        *sink.lock().unwrap() = Some(snapshot.clone());
    };

    let dash = Dashboard::spawn(MockFactory::new(), RunParams::default(), config(200.0), consumer)
        .unwrap();
    dash.play_or_pause().unwrap();
    thread::sleep(Duration::from_millis(30));
    drop(dash);

    // Dropping joined the delivery thread; the last snapshot stays put.
    let before = latest.lock().unwrap().clone().unwrap();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(latest.lock().unwrap().as_ref(), Some(&before));
}

#[test]
fn commands_from_many_threads_are_serialized() {
    let (consumer, _log) = RecordingConsumer::pair();
    let mut dash =
        Dashboard::spawn(MockFactory::new(), RunParams::default(), config(500.0), consumer)
            .unwrap();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let handle = dash.handle();
            thread::spawn(move || {
                for _ in 0..10 {
                    // A full queue is back-pressure, not failure.
                    let deadline = Instant::now() + Duration::from_secs(5);
                    while handle.play_or_pause().is_err() {
                        assert!(Instant::now() < deadline);
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let status = dash.status().unwrap();
    assert_eq!(status.state, ControlState::Idle);
    assert_eq!(status.metrics.plays, 20);
    assert_eq!(status.metrics.pauses, 20);
    dash.shutdown();
}
