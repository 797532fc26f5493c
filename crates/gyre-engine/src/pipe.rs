//! Single-slot, last-write-wins snapshot pipe.
//!
//! [`PipeSender::send`] overwrites whatever snapshot is pending and
//! wakes the receiver; it never waits for the consumer. A receiver
//! therefore sees at most one value per wake-up, always the newest one,
//! and never a value that was not sent. There is no queue and no
//! backpressure signal.
//!
//! The slot is a `Mutex<SlotState>` plus a `Condvar`. The critical
//! section on the send side is a pointer swap and two counter bumps.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use gyre_core::{ConfigError, Snapshot, SnapshotConsumer};
use tracing::debug;

// ── PipeStats ──────────────────────────────────────────────────────

/// Delivery counters for one pipe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipeStats {
    /// Snapshots passed to `send`.
    pub sent: u64,
    /// Snapshots handed to the receiver.
    pub delivered: u64,
    /// Snapshots overwritten by a newer send before delivery.
    pub superseded: u64,
}

// ── RecvError ──────────────────────────────────────────────────────

/// The pipe has no pending snapshot and every sender is gone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipeClosed;

impl std::fmt::Display for PipeClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "snapshot pipe closed")
    }
}

impl std::error::Error for PipeClosed {}

/// Error from [`PipeReceiver::recv_timeout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecvTimeoutError {
    /// Nothing was sent before the timeout elapsed.
    Timeout,
    /// Every sender is gone and nothing is pending.
    Closed,
}

impl std::fmt::Display for RecvTimeoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out waiting for a snapshot"),
            Self::Closed => write!(f, "snapshot pipe closed"),
        }
    }
}

impl std::error::Error for RecvTimeoutError {}

// ── Shared slot ────────────────────────────────────────────────────

#[derive(Default)]
struct SlotState {
    pending: Option<Snapshot>,
    senders: usize,
    stats: PipeStats,
}

#[derive(Default)]
struct Shared {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl Shared {
    // A panic while holding the lock cannot leave the slot half-written
    // (every mutation is a single assignment), so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a connected sender/receiver pair.
pub fn snapshot_pipe() -> (PipeSender, PipeReceiver) {
    let shared = Arc::new(Shared::default());
    shared.lock().senders = 1;
    (
        PipeSender {
            shared: Arc::clone(&shared),
        },
        PipeReceiver { shared },
    )
}

// ── PipeSender ─────────────────────────────────────────────────────

/// Producer side. Cloneable; the pipe closes when the last clone drops.
pub struct PipeSender {
    shared: Arc<Shared>,
}

impl PipeSender {
    /// Replace the pending snapshot with `snapshot` and wake the receiver.
    pub fn send(&self, snapshot: Snapshot) {
        let mut state = self.shared.lock();
        state.stats.sent += 1;
        if state.pending.replace(snapshot).is_some() {
            state.stats.superseded += 1;
        }
        drop(state);
        self.shared.ready.notify_one();
    }

    /// Current delivery counters.
    pub fn stats(&self) -> PipeStats {
        self.shared.lock().stats
    }
}

impl Clone for PipeSender {
    fn clone(&self) -> Self {
        self.shared.lock().senders += 1;
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for PipeSender {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.senders -= 1;
        let closed = state.senders == 0;
        drop(state);
        if closed {
            self.shared.ready.notify_all();
        }
    }
}

// ── PipeReceiver ───────────────────────────────────────────────────

/// Consumer side.
pub struct PipeReceiver {
    shared: Arc<Shared>,
}

impl PipeReceiver {
    fn take(state: &mut SlotState) -> Option<Snapshot> {
        let snapshot = state.pending.take()?;
        state.stats.delivered += 1;
        Some(snapshot)
    }

    /// Take the pending snapshot, if any, without waiting.
    pub fn try_recv(&self) -> Option<Snapshot> {
        Self::take(&mut self.shared.lock())
    }

    /// Wait for a snapshot.
    ///
    /// A snapshot pending when the last sender drops is still delivered;
    /// after that the pipe reports [`PipeClosed`].
    pub fn recv(&self) -> Result<Snapshot, PipeClosed> {
        let mut state = self.shared.lock();
        loop {
            if let Some(snapshot) = Self::take(&mut state) {
                return Ok(snapshot);
            }
            if state.senders == 0 {
                return Err(PipeClosed);
            }
            state = self
                .shared
                .ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Wait up to `timeout` for a snapshot.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Snapshot, RecvTimeoutError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.lock();
        loop {
            if let Some(snapshot) = Self::take(&mut state) {
                return Ok(snapshot);
            }
            if state.senders == 0 {
                return Err(RecvTimeoutError::Closed);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(RecvTimeoutError::Timeout);
            }
            state = self
                .shared
                .ready
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Whether every sender has been dropped.
    pub fn is_closed(&self) -> bool {
        self.shared.lock().senders == 0
    }

    /// Current delivery counters.
    pub fn stats(&self) -> PipeStats {
        self.shared.lock().stats
    }
}

// ── Subscription ───────────────────────────────────────────────────

/// A consumer running on its own delivery thread.
///
/// The thread calls [`SnapshotConsumer::consume`] with each snapshot it
/// receives and exits once the pipe closes. The consumer is returned by
/// [`join`](Self::join).
pub struct Subscription<C> {
    thread: Option<JoinHandle<C>>,
    shared: Arc<Shared>,
}

impl<C: SnapshotConsumer + 'static> Subscription<C> {
    /// Spawn the delivery thread for `receiver`.
    pub fn spawn(receiver: PipeReceiver, mut consumer: C) -> Result<Self, ConfigError> {
        let shared = Arc::clone(&receiver.shared);
        let thread = thread::Builder::new()
            .name("gyre-pipe".into())
            .spawn(move || {
                while let Ok(snapshot) = receiver.recv() {
                    consumer.consume(&snapshot);
                }
                debug!("snapshot pipe closed; delivery thread exiting");
                consumer
            })
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: format!("gyre-pipe: {e}"),
            })?;
        Ok(Self {
            thread: Some(thread),
            shared,
        })
    }
}

impl<C> Subscription<C> {
    /// Current delivery counters.
    pub fn stats(&self) -> PipeStats {
        self.shared.lock().stats
    }

    /// Wait for the delivery thread to finish and recover the consumer.
    ///
    /// Blocks until every sender has been dropped. Returns `None` if the
    /// consumer panicked.
    pub fn join(mut self) -> Option<C> {
        self.thread.take()?.join().ok()
    }
}
