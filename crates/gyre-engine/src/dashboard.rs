//! Threaded runtime hosting a [`Controller`] behind a command channel.
//!
//! A [`Dashboard`] runs three kinds of thread:
//! - the **control thread** owns the controller and applies commands one
//!   at a time, reaping a halted tick task whenever it sits idle;
//! - the **tick thread** is the controller's [`PeriodicTask`](crate::scheduler::PeriodicTask)
//!   while Running;
//! - the **delivery thread** hands the latest snapshot to the consumer.
//!
//! Commands travel over a bounded crossbeam channel with a reply channel
//! each, so callers on any thread see their own result and commands are
//! serialized. [`DashboardHandle`] is a cloneable submitter for callers
//! that do not own the dashboard.

use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use gyre_core::{
    ConfigError, EngineFactory, EngineGeneration, RunParams, SnapshotConsumer, StepError,
};
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::controller::{ControlError, ControlEvent, ControlState, Controller};
use crate::metrics::ControlMetrics;
use crate::pipe::{snapshot_pipe, PipeStats, Subscription};

// ── Error types ────────────────────────────────────────────────────

/// Error submitting a command to the control thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitError {
    /// The control thread has shut down.
    Shutdown,
    /// The command channel is full.
    ChannelFull,
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shutdown => write!(f, "control thread has shut down"),
            Self::ChannelFull => write!(f, "command channel full"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// A dashboard command that could not be applied.
#[derive(Clone, Debug, PartialEq)]
pub enum DashboardError {
    /// The command never reached the controller.
    Submit(SubmitError),
    /// The controller rejected the command.
    Control(ControlError),
}

impl std::fmt::Display for DashboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submit(e) => write!(f, "submit: {e}"),
            Self::Control(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DashboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Submit(e) => Some(e),
            Self::Control(e) => Some(e),
        }
    }
}

impl From<SubmitError> for DashboardError {
    fn from(e: SubmitError) -> Self {
        Self::Submit(e)
    }
}

impl From<ControlError> for DashboardError {
    fn from(e: ControlError) -> Self {
        Self::Control(e)
    }
}

// ── Status / ShutdownReport ────────────────────────────────────────

/// Point-in-time view of the hosted controller.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardStatus {
    /// Controller state.
    pub state: ControlState,
    /// Parameters the next reset will use.
    pub params: RunParams,
    /// Generation of the current engine.
    pub generation: EngineGeneration,
    /// Cumulative counters.
    pub metrics: ControlMetrics,
    /// Most recent fault not yet taken.
    pub last_fault: Option<StepError>,
}

/// Report from [`Dashboard::shutdown`].
#[derive(Debug)]
pub struct ShutdownReport {
    /// Total time spent shutting down.
    pub total_ms: u64,
    /// Whether the control thread was joined successfully.
    pub control_joined: bool,
    /// Whether the delivery thread was joined successfully.
    pub delivery_joined: bool,
    /// Controller status after its tick task was stopped. `None` on a
    /// repeated shutdown or if the control thread panicked.
    pub final_status: Option<DashboardStatus>,
}

// ── Requests ───────────────────────────────────────────────────────

enum Request {
    Dispatch {
        event: ControlEvent,
        reply: Sender<Result<ControlState, ControlError>>,
    },
    TakeFault {
        reply: Sender<Option<StepError>>,
    },
    Status {
        reply: Sender<DashboardStatus>,
    },
    Shutdown,
}

/// Type-erased delivery thread, so the dashboard is not generic over
/// the consumer.
trait Delivery: Send {
    fn stats(&self) -> PipeStats;
    fn join(self: Box<Self>) -> bool;
}

impl<C: SnapshotConsumer + 'static> Delivery for Subscription<C> {
    fn stats(&self) -> PipeStats {
        Subscription::stats(self)
    }

    fn join(self: Box<Self>) -> bool {
        Subscription::join(*self).is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownState {
    Running,
    Dropped,
}

// ── DashboardHandle ────────────────────────────────────────────────

/// Cloneable command submitter for a [`Dashboard`].
///
/// Every call blocks until the control thread has applied the command.
/// After the dashboard shuts down every call fails with
/// [`SubmitError::Shutdown`].
#[derive(Clone)]
pub struct DashboardHandle {
    cmd_tx: Sender<Request>,
}

impl DashboardHandle {
    /// Submit one command and wait for its result.
    pub fn dispatch(&self, event: ControlEvent) -> Result<ControlState, DashboardError> {
        let (reply, reply_rx) = crossbeam_channel::bounded(1);
        self.submit(Request::Dispatch { event, reply })?;
        let result = reply_rx.recv().map_err(|_| SubmitError::Shutdown)?;
        Ok(result?)
    }

    /// Toggle between Idle and Running.
    pub fn play_or_pause(&self) -> Result<ControlState, DashboardError> {
        self.dispatch(ControlEvent::PlayOrPause)
    }

    /// Rebuild the engine from the current parameters and go Idle.
    pub fn reset(&self) -> Result<ControlState, DashboardError> {
        self.dispatch(ControlEvent::Reset)
    }

    /// Set the particle count for the next reset.
    pub fn set_particle_count(&self, particle_count: usize) -> Result<(), DashboardError> {
        self.dispatch(ControlEvent::SetParticleCount(particle_count))
            .map(drop)
    }

    /// Set the placement bounds for the next reset.
    pub fn set_bounds(&self, bounds: f64) -> Result<(), DashboardError> {
        self.dispatch(ControlEvent::SetBounds(bounds)).map(drop)
    }

    /// Set the time delta for the next reset.
    pub fn set_time_delta(&self, time_delta: f64) -> Result<(), DashboardError> {
        self.dispatch(ControlEvent::SetTimeDelta(time_delta))
            .map(drop)
    }

    /// Take the most recent engine fault, if any.
    pub fn take_fault(&self) -> Result<Option<StepError>, SubmitError> {
        let (reply, reply_rx) = crossbeam_channel::bounded(1);
        self.submit(Request::TakeFault { reply })?;
        reply_rx.recv().map_err(|_| SubmitError::Shutdown)
    }

    /// Current controller status.
    pub fn status(&self) -> Result<DashboardStatus, SubmitError> {
        let (reply, reply_rx) = crossbeam_channel::bounded(1);
        self.submit(Request::Status { reply })?;
        reply_rx.recv().map_err(|_| SubmitError::Shutdown)
    }

    fn submit(&self, request: Request) -> Result<(), SubmitError> {
        self.cmd_tx.try_send(request).map_err(|e| match e {
            TrySendError::Full(_) => SubmitError::ChannelFull,
            TrySendError::Disconnected(_) => SubmitError::Shutdown,
        })
    }
}

// ── Dashboard ──────────────────────────────────────────────────────

/// A controller running on its own thread, with a consumer fed on
/// another.
pub struct Dashboard {
    handle: DashboardHandle,
    control_thread: Option<JoinHandle<DashboardStatus>>,
    delivery: Option<Box<dyn Delivery>>,
    state: ShutdownState,
}

impl Dashboard {
    /// Build the first engine, publish its snapshot to `consumer` and
    /// start the control and delivery threads. Starts Idle.
    pub fn spawn<F, C>(
        factory: F,
        params: RunParams,
        config: DashboardConfig,
        consumer: C,
    ) -> Result<Self, ConfigError>
    where
        F: EngineFactory + 'static,
        C: SnapshotConsumer + 'static,
    {
        config.validate()?;
        let (pipe_tx, pipe_rx) = snapshot_pipe();
        let delivery = Subscription::spawn(pipe_rx, consumer)?;
        let controller = Controller::new(factory, params, &config.controller, pipe_tx)?;

        let (cmd_tx, cmd_rx) = crossbeam_channel::bounded(config.command_queue);
        let poll = config.fault_poll();
        let control_thread = thread::Builder::new()
            .name("gyre-control".into())
            .spawn(move || control_loop(controller, cmd_rx, poll))
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: format!("gyre-control: {e}"),
            })?;

        info!(
            particle_count = params.particle_count,
            tick_rate_hz = config.controller.tick_rate_hz,
            "dashboard started"
        );
        Ok(Self {
            handle: DashboardHandle { cmd_tx },
            control_thread: Some(control_thread),
            delivery: Some(Box::new(delivery)),
            state: ShutdownState::Running,
        })
    }

    /// A cloneable submitter for other threads.
    pub fn handle(&self) -> DashboardHandle {
        self.handle.clone()
    }

    /// Submit one command and wait for its result.
    pub fn dispatch(&self, event: ControlEvent) -> Result<ControlState, DashboardError> {
        self.handle.dispatch(event)
    }

    /// Toggle between Idle and Running.
    pub fn play_or_pause(&self) -> Result<ControlState, DashboardError> {
        self.handle.play_or_pause()
    }

    /// Rebuild the engine from the current parameters and go Idle.
    pub fn reset(&self) -> Result<ControlState, DashboardError> {
        self.handle.reset()
    }

    /// Set the particle count for the next reset.
    pub fn set_particle_count(&self, particle_count: usize) -> Result<(), DashboardError> {
        self.handle.set_particle_count(particle_count)
    }

    /// Set the placement bounds for the next reset.
    pub fn set_bounds(&self, bounds: f64) -> Result<(), DashboardError> {
        self.handle.set_bounds(bounds)
    }

    /// Set the time delta for the next reset.
    pub fn set_time_delta(&self, time_delta: f64) -> Result<(), DashboardError> {
        self.handle.set_time_delta(time_delta)
    }

    /// Take the most recent engine fault, if any.
    pub fn take_fault(&self) -> Result<Option<StepError>, SubmitError> {
        self.handle.take_fault()
    }

    /// Current controller status.
    pub fn status(&self) -> Result<DashboardStatus, SubmitError> {
        self.handle.status()
    }

    /// Snapshot pipe counters, readable without a round trip.
    pub fn pipe_stats(&self) -> PipeStats {
        self.delivery
            .as_ref()
            .map(|d| d.stats())
            .unwrap_or_default()
    }

    /// Stop the tick task, close the pipe and join every thread.
    ///
    /// Idempotent; later calls return an empty report.
    pub fn shutdown(&mut self) -> ShutdownReport {
        if self.state == ShutdownState::Dropped {
            return ShutdownReport {
                total_ms: 0,
                control_joined: true,
                delivery_joined: true,
                final_status: None,
            };
        }
        let start = Instant::now();
        self.state = ShutdownState::Dropped;

        // Blocking send: a full queue drains as the control thread works.
        if self.handle.cmd_tx.send(Request::Shutdown).is_err() {
            debug!("control thread already gone");
        }
        let (control_joined, final_status) = match self.control_thread.take() {
            Some(handle) => match handle.join() {
                Ok(status) => (true, Some(status)),
                Err(_) => {
                    warn!("control thread panicked");
                    (false, None)
                }
            },
            None => (true, None),
        };
        // The controller, and with it the last pipe sender, is gone; the
        // delivery thread drains the final snapshot and exits.
        let delivery_joined = self.delivery.take().map_or(true, |d| d.join());

        let total_ms = start.elapsed().as_millis() as u64;
        info!(total_ms, control_joined, delivery_joined, "dashboard shut down");
        ShutdownReport {
            total_ms,
            control_joined,
            delivery_joined,
            final_status,
        }
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        if self.state != ShutdownState::Dropped {
            self.shutdown();
        }
    }
}

// ── control thread ─────────────────────────────────────────────────

fn status_of<F: EngineFactory>(controller: &Controller<F>) -> DashboardStatus {
    DashboardStatus {
        state: controller.state(),
        params: controller.params(),
        generation: controller.generation(),
        metrics: controller.metrics(),
        last_fault: controller.last_fault().cloned(),
    }
}

fn control_loop<F: EngineFactory>(
    mut controller: Controller<F>,
    cmd_rx: Receiver<Request>,
    poll: std::time::Duration,
) -> DashboardStatus {
    loop {
        match cmd_rx.recv_timeout(poll) {
            Ok(Request::Dispatch { event, reply }) => {
                let result = controller.dispatch(event);
                if let Err(error) = &result {
                    debug!(?event, %error, "command rejected");
                }
                if reply.send(result).is_err() {
                    warn!(?event, "caller dropped reply channel");
                }
            }
            Ok(Request::TakeFault { reply }) => {
                if reply.send(controller.take_fault()).is_err() {
                    warn!("caller dropped fault reply channel");
                }
            }
            Ok(Request::Status { reply }) => {
                controller.reap_halted();
                if reply.send(status_of(&controller)).is_err() {
                    warn!("caller dropped status reply channel");
                }
            }
            Ok(Request::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                // The controller already logs the fault it reaps.
                controller.reap_halted();
            }
        }
    }
    controller.halt();
    status_of(&controller)
}
