//! Fixed-period repeating task on a dedicated thread.
//!
//! [`PeriodicTask`] moves a piece of state onto a named thread and calls
//! a tick function on it once per period. The state comes back by value
//! when the task is stopped, so whoever owns the handle also owns the
//! state whenever no tick can be running.
//!
//! Guarantees:
//! - ticks for one task never overlap; the next deadline is only
//!   considered after the previous tick returns, and deadlines missed
//!   while a tick overran are skipped rather than replayed;
//! - the first tick fires one full period after start;
//! - [`stop`](PeriodicTask::stop) is idempotent, interrupts the
//!   between-tick sleep immediately, and once it returns no further tick
//!   will begin. A tick already in progress runs to completion first;
//! - a tick returning `Err` halts the task. The error is handed back in
//!   [`TaskExit::fault`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use gyre_core::{ConfigError, StepError};
use tracing::{debug, warn};

// ── TaskExit / StartError ──────────────────────────────────────────

/// What a stopped task hands back.
#[derive(Debug)]
pub struct TaskExit<S> {
    /// The state the task was ticking.
    pub state: S,
    /// The error that halted the task, if a tick failed.
    pub fault: Option<StepError>,
    /// Number of ticks that completed successfully.
    pub ticks: u64,
}

/// A failed [`PeriodicTask::start`]. The state is returned untouched.
#[derive(Debug)]
pub struct StartError<S> {
    /// Why the task could not start.
    pub error: ConfigError,
    /// The state that would have been ticked.
    pub state: S,
}

// ── TaskCounters ───────────────────────────────────────────────────

/// Live counters shared between a task handle and its thread.
#[derive(Debug, Default)]
pub(crate) struct TaskCounters {
    ticks: AtomicU64,
    missed_deadlines: AtomicU64,
}

impl TaskCounters {
    pub(crate) fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub(crate) fn missed_deadlines(&self) -> u64 {
        self.missed_deadlines.load(Ordering::Relaxed)
    }
}

// ── PeriodicTask ───────────────────────────────────────────────────

/// Handle to a live repeating task.
///
/// Dropping the handle stops the task (and drops its state).
pub struct PeriodicTask<S> {
    period: Duration,
    stop_flag: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
    counters: Arc<TaskCounters>,
    thread: Option<JoinHandle<Option<TaskExit<S>>>>,
}

impl<S: Send + 'static> PeriodicTask<S> {
    /// Spawn a thread named `name` that calls `tick(&mut state)` every
    /// `period`, starting one period from now.
    ///
    /// A zero period is rejected with [`ConfigError::InvalidPeriod`]. On
    /// any failure the state is handed back inside [`StartError`].
    pub fn start<F>(
        name: &str,
        period: Duration,
        state: S,
        tick: F,
    ) -> Result<Self, StartError<S>>
    where
        F: FnMut(&mut S) -> Result<(), StepError> + Send + 'static,
    {
        if period.is_zero() {
            return Err(StartError {
                error: ConfigError::InvalidPeriod,
                state,
            });
        }

        let stop_flag = Arc::new(AtomicBool::new(false));
        let active = Arc::new(AtomicBool::new(true));
        let counters = Arc::new(TaskCounters::default());

        // The state is handed over only after the spawn succeeds, so a
        // spawn failure cannot lose it.
        let (state_tx, state_rx) = crossbeam_channel::bounded::<S>(1);

        let runner = TaskRunner {
            period,
            stop_flag: Arc::clone(&stop_flag),
            active: Arc::clone(&active),
            counters: Arc::clone(&counters),
        };
        let spawned = thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                let state = state_rx.recv().ok()?;
                Some(runner.run(state, tick))
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                return Err(StartError {
                    error: ConfigError::ThreadSpawnFailed {
                        reason: format!("{name}: {e}"),
                    },
                    state,
                })
            }
        };

        if let Err(crossbeam_channel::SendError(state)) = state_tx.send(state) {
            return Err(StartError {
                error: ConfigError::ThreadSpawnFailed {
                    reason: format!("{name}: task thread exited before receiving its state"),
                },
                state,
            });
        }

        Ok(Self {
            period,
            stop_flag,
            active,
            counters,
            thread: Some(handle),
        })
    }
}

impl<S> PeriodicTask<S> {
    /// Whether the task is still scheduling ticks.
    ///
    /// False once [`stop`](Self::stop) has been called or the tick
    /// function failed or panicked.
    pub fn is_active(&self) -> bool {
        self.thread.is_some() && self.active.load(Ordering::Acquire)
    }

    /// Whether the task ended on its own, by a tick failure or a panic.
    pub fn is_halted(&self) -> bool {
        self.thread.is_some() && !self.active.load(Ordering::Acquire)
    }

    /// The configured period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.counters.ticks()
    }

    /// Deadlines skipped because a tick overran.
    pub fn missed_deadlines(&self) -> u64 {
        self.counters.missed_deadlines()
    }

    /// Stop the task and wait for its thread to finish.
    ///
    /// Returns the state on the first call; later calls are no-ops
    /// returning `None`. Also returns `None` if the tick function
    /// panicked, in which case the state is lost.
    pub fn stop(&mut self) -> Option<TaskExit<S>> {
        let handle = self.thread.take()?;
        self.stop_flag.store(true, Ordering::Release);
        // Wake the thread if it is parked waiting for the next deadline.
        handle.thread().unpark();

        match handle.join() {
            Ok(exit) => exit,
            Err(_) => {
                warn!("periodic task panicked; its state is lost");
                None
            }
        }
    }
}

impl<S> Drop for PeriodicTask<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Marks the task inactive when dropped.
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Skip every deadline at or before `now`, starting from `deadline`.
///
/// Returns the first deadline after `now` on the original period grid
/// and how many deadlines were skipped (saturating).
fn catch_up(deadline: Instant, now: Instant, period: Duration) -> (Instant, u64) {
    let behind = now.duration_since(deadline).as_nanos();
    let period_ns = period.as_nanos();
    let skipped = u64::try_from(behind / period_ns)
        .unwrap_or(u64::MAX)
        .saturating_add(1);
    let rem = behind % period_ns;
    let into_period = Duration::new((rem / NANOS_PER_SEC) as u64, (rem % NANOS_PER_SEC) as u32);
    (now + (period - into_period), skipped)
}

// ── TaskRunner ─────────────────────────────────────────────────────

/// The loop executed on the task thread.
struct TaskRunner {
    period: Duration,
    stop_flag: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
    counters: Arc<TaskCounters>,
}

impl TaskRunner {
    fn run<S, F>(self, mut state: S, mut tick: F) -> TaskExit<S>
    where
        F: FnMut(&mut S) -> Result<(), StepError>,
    {
        // Cleared however the thread ends, unwinding included.
        let _active = ActiveGuard(Arc::clone(&self.active));
        let mut deadline = Instant::now() + self.period;
        let mut fault = None;

        while self.wait_until(deadline) {
            if let Err(e) = tick(&mut state) {
                warn!(error = %e, "tick failed; halting periodic task");
                fault = Some(e);
                break;
            }
            self.counters.ticks.fetch_add(1, Ordering::Relaxed);

            deadline += self.period;
            let now = Instant::now();
            if deadline <= now {
                let (next, skipped) = catch_up(deadline, now, self.period);
                deadline = next;
                self.counters
                    .missed_deadlines
                    .fetch_add(skipped, Ordering::Relaxed);
                debug!(skipped, "tick overran its period");
            }
        }

        TaskExit {
            state,
            fault,
            ticks: self.counters.ticks(),
        }
    }

    /// Park until `deadline`. Returns `false` if a stop was requested.
    ///
    /// `park_timeout` is used instead of `thread::sleep` so that
    /// `unpark()` from [`PeriodicTask::stop`] ends the wait immediately
    /// regardless of the period length.
    fn wait_until(&self, deadline: Instant) -> bool {
        loop {
            if self.stop_flag.load(Ordering::Acquire) {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::park_timeout(deadline - now);
        }
    }
}
