//! Play/pause/reset state machine around one engine.
//!
//! The [`Controller`] owns the engine outright while Idle. Playing moves
//! the engine (wrapped in a [`TickLoop`]) onto a [`PeriodicTask`];
//! pausing or resetting stops that task, joins its thread and takes the
//! engine back by value. A command and a tick therefore never touch the
//! same engine at once, and a task is always stopped before the engine
//! it drives is dropped or replaced.
//!
//! Parameter setters only change the stored [`RunParams`]; the new
//! values take effect at the next reset.

use std::time::Duration;

use gyre_core::{ConfigError, EngineFactory, EngineGeneration, ParamLimits, RunParams, StepError};
use tracing::{debug, info, warn};

use crate::bootstrap;
use crate::config::ControllerConfig;
use crate::metrics::ControlMetrics;
use crate::pipe::PipeSender;
use crate::scheduler::{PeriodicTask, StartError, TaskExit};
use crate::tick::TickLoop;

/// Name given to the tick task's thread.
const TICK_THREAD: &str = "gyre-tick";

// ── ControlState / ControlEvent ────────────────────────────────────

/// Observable controller state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlState {
    /// No tick task is live. Initial state.
    Idle,
    /// A tick task is live and scheduling ticks.
    Running,
}

impl std::fmt::Display for ControlState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
        }
    }
}

/// A user command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlEvent {
    /// Toggle between Idle and Running.
    PlayOrPause,
    /// Rebuild the engine from the current parameters and go Idle.
    Reset,
    /// Set the particle count used by the next reset.
    SetParticleCount(usize),
    /// Set the placement bounds used by the next reset.
    SetBounds(f64),
    /// Set the time delta used by the next reset.
    SetTimeDelta(f64),
}

// ── ControlError ───────────────────────────────────────────────────

/// Errors returned by controller commands.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlError {
    /// A configuration value was rejected.
    Config(ConfigError),
    /// An engine update failed and halted the tick task.
    Step(StepError),
    /// There is no engine to drive. Happens only after a tick panicked
    /// and a reset has not yet succeeded.
    NoEngine,
}

impl std::fmt::Display for ControlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration: {e}"),
            Self::Step(e) => write!(f, "tick halted: {e}"),
            Self::NoEngine => write!(f, "no engine; reset required"),
        }
    }
}

impl std::error::Error for ControlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Step(e) => Some(e),
            Self::NoEngine => None,
        }
    }
}

impl From<ConfigError> for ControlError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StepError> for ControlError {
    fn from(e: StepError) -> Self {
        Self::Step(e)
    }
}

// ── Controller ─────────────────────────────────────────────────────

enum Phase<E> {
    Idle(TickLoop<E>),
    Running(PeriodicTask<TickLoop<E>>),
    /// The engine was lost to a panicking tick.
    Vacant,
}

#[derive(Debug, Default)]
struct Counters {
    plays: u64,
    pauses: u64,
    resets: u64,
    faults: u64,
    ticks: u64,
    missed_deadlines: u64,
}

/// Owns the engine, the tick task and the run parameters.
pub struct Controller<F: EngineFactory> {
    factory: F,
    params: RunParams,
    limits: ParamLimits,
    period: Duration,
    pipe: PipeSender,
    phase: Phase<F::Engine>,
    generation: EngineGeneration,
    last_fault: Option<StepError>,
    counters: Counters,
}

impl<F: EngineFactory> Controller<F> {
    /// Validate the configuration, build the first engine and publish its
    /// initial snapshot. The controller starts Idle.
    pub fn new(
        factory: F,
        params: RunParams,
        config: &ControllerConfig,
        pipe: PipeSender,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        params.validate()?;
        let mut controller = Self {
            factory,
            params,
            limits: config.limits,
            period: config.period()?,
            pipe,
            phase: Phase::Vacant,
            generation: EngineGeneration(0),
            last_fault: None,
            counters: Counters::default(),
        };
        controller.rebuild()?;
        Ok(controller)
    }

    /// Current state. Running exactly when a live task is scheduling
    /// ticks; a task halted by a fault already reads Idle.
    pub fn state(&self) -> ControlState {
        match &self.phase {
            Phase::Running(task) if task.is_active() => ControlState::Running,
            _ => ControlState::Idle,
        }
    }

    /// Whether a tick task handle exists, live or halted.
    pub fn has_task(&self) -> bool {
        matches!(self.phase, Phase::Running(_))
    }

    /// Parameters the next reset will use.
    pub fn params(&self) -> RunParams {
        self.params
    }

    /// Setter limits.
    pub fn limits(&self) -> ParamLimits {
        self.limits
    }

    /// Tick period while Running.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Generation of the current engine. Bumped by every successful reset.
    pub fn generation(&self) -> EngineGeneration {
        self.generation
    }

    /// The current engine while Idle. `None` while Running or vacant.
    pub fn idle_engine(&self) -> Option<&F::Engine> {
        match &self.phase {
            Phase::Idle(tick_loop) => Some(tick_loop.engine()),
            _ => None,
        }
    }

    /// The most recent fault, if it has not been taken.
    pub fn last_fault(&self) -> Option<&StepError> {
        self.last_fault.as_ref()
    }

    /// Take the most recent fault, reaping a halted task first.
    pub fn take_fault(&mut self) -> Option<StepError> {
        self.reap_halted();
        self.last_fault.take()
    }

    /// Apply one command.
    pub fn dispatch(&mut self, event: ControlEvent) -> Result<ControlState, ControlError> {
        match event {
            ControlEvent::PlayOrPause => self.play_or_pause(),
            ControlEvent::Reset => self.reset(),
            ControlEvent::SetParticleCount(n) => self.set_particle_count(n).map(|()| self.state()),
            ControlEvent::SetBounds(b) => self.set_bounds(b).map(|()| self.state()),
            ControlEvent::SetTimeDelta(dt) => self.set_time_delta(dt).map(|()| self.state()),
        }
    }

    /// Idle → Running, or Running → Idle.
    pub fn play_or_pause(&mut self) -> Result<ControlState, ControlError> {
        self.reap_halted();
        match std::mem::replace(&mut self.phase, Phase::Vacant) {
            Phase::Idle(tick_loop) => {
                match PeriodicTask::start(TICK_THREAD, self.period, tick_loop, TickLoop::step) {
                    Ok(task) => {
                        self.phase = Phase::Running(task);
                        self.counters.plays += 1;
                        info!(generation = %self.generation, "playing");
                        Ok(ControlState::Running)
                    }
                    Err(StartError { error, state }) => {
                        self.phase = Phase::Idle(state);
                        warn!(%error, "tick task failed to start");
                        Err(error.into())
                    }
                }
            }
            running @ Phase::Running(_) => {
                self.phase = running;
                self.halt();
                self.counters.pauses += 1;
                info!(generation = %self.generation, "paused");
                Ok(ControlState::Idle)
            }
            Phase::Vacant => Err(ControlError::NoEngine),
        }
    }

    /// Stop any tick task, replace the engine with a fresh one built from
    /// the current parameters, publish its initial snapshot and go Idle.
    ///
    /// If the new engine cannot be built, the old one is kept (Idle) and
    /// the error is returned.
    pub fn reset(&mut self) -> Result<ControlState, ControlError> {
        self.rebuild()?;
        Ok(ControlState::Idle)
    }

    /// Stop the tick task if one exists and keep the engine. Unlike
    /// [`play_or_pause`](Self::play_or_pause) this never starts anything.
    pub fn halt(&mut self) -> ControlState {
        if let Phase::Running(task) = &mut self.phase {
            let exit = task.stop();
            self.counters.missed_deadlines += task.missed_deadlines();
            self.phase = self.recover(exit);
        }
        ControlState::Idle
    }

    /// Set the particle count for the next reset.
    pub fn set_particle_count(&mut self, particle_count: usize) -> Result<(), ControlError> {
        self.params.particle_count = self.limits.check_particle_count(particle_count)?;
        debug!(particle_count, "particle count set; applies at next reset");
        Ok(())
    }

    /// Set the placement bounds for the next reset.
    pub fn set_bounds(&mut self, bounds: f64) -> Result<(), ControlError> {
        self.params.bounds = self.limits.check_bounds(bounds)?;
        debug!(bounds, "bounds set; applies at next reset");
        Ok(())
    }

    /// Set the time delta for the next reset.
    pub fn set_time_delta(&mut self, time_delta: f64) -> Result<(), ControlError> {
        self.params.time_delta = self.limits.check_time_delta(time_delta)?;
        debug!(time_delta, "time delta set; applies at next reset");
        Ok(())
    }

    /// If the tick task halted on a fault, join it, take the engine back
    /// and record the fault. Returns the fault reaped by this call.
    pub fn reap_halted(&mut self) -> Option<StepError> {
        let halted = matches!(&self.phase, Phase::Running(task) if task.is_halted());
        if !halted {
            return None;
        }
        let faults = self.counters.faults;
        self.halt();
        if self.counters.faults > faults {
            self.last_fault.clone()
        } else {
            None
        }
    }

    /// Cumulative counters, including the live task.
    pub fn metrics(&self) -> ControlMetrics {
        let (live_ticks, live_missed) = match &self.phase {
            Phase::Running(task) => (task.ticks(), task.missed_deadlines()),
            _ => (0, 0),
        };
        ControlMetrics {
            plays: self.counters.plays,
            pauses: self.counters.pauses,
            resets: self.counters.resets,
            faults: self.counters.faults,
            ticks: self.counters.ticks + live_ticks,
            missed_deadlines: self.counters.missed_deadlines + live_missed,
            pipe: self.pipe.stats(),
        }
    }

    // ── internals ──────────────────────────────────────────────────

    /// Turn a stopped task's exit into the next phase, recording ticks
    /// and any fault.
    fn recover(&mut self, exit: Option<TaskExit<TickLoop<F::Engine>>>) -> Phase<F::Engine> {
        let Some(exit) = exit else {
            warn!(generation = %self.generation, "tick task panicked; engine lost");
            self.counters.faults += 1;
            self.last_fault = Some(StepError::EngineFailed {
                reason: "tick panicked; engine lost".into(),
            });
            return Phase::Vacant;
        };
        self.counters.ticks += exit.ticks;
        if let Some(fault) = exit.fault {
            warn!(generation = %self.generation, ticks = exit.ticks, %fault, "tick task halted");
            self.counters.faults += 1;
            self.last_fault = Some(fault);
        }
        Phase::Idle(exit.state)
    }

    fn rebuild(&mut self) -> Result<(), ConfigError> {
        // Joining here lets an in-flight tick finish and publish against
        // the old engine before the new engine's first snapshot is sent.
        self.halt();
        let engine = match bootstrap::build_engine(&self.factory, &self.params) {
            Ok(engine) => engine,
            Err(error) => {
                warn!(%error, params = ?self.params, "reset failed; keeping previous engine");
                return Err(error);
            }
        };
        self.generation = self.generation.next();
        let tick_loop = TickLoop::new(engine, self.generation, self.params.time_delta, self.pipe.clone());
        tick_loop.publish();
        self.phase = Phase::Idle(tick_loop);
        self.counters.resets += 1;
        info!(
            generation = %self.generation,
            particle_count = self.params.particle_count,
            bounds = self.params.bounds,
            time_delta = self.params.time_delta,
            "reset"
        );
        Ok(())
    }
}
