//! Jittered exponential backoff for stream reconnection

use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;

/// First retry delay.
pub(crate) const BASE_DELAY_MS: u64 = 2000;
/// Multiplier applied per attempt.
pub(crate) const GROWTH: f64 = 1.5;
/// Ceiling on the nominal delay.
pub(crate) const MAX_DELAY_MS: u64 = 15_000;
/// Uniform random jitter added on top, exclusive upper bound.
pub(crate) const JITTER_MS: u64 = 1000;

/// Nominal (jitter-free) delay before retry `attempt` (1-indexed):
/// `min(base * growth^(attempt-1), cap)`.
pub(crate) fn nominal_delay(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1);
    let ms = BASE_DELAY_MS as f64 * GROWTH.powi(exp as i32);
    Duration::from_millis((ms as u64).min(MAX_DELAY_MS))
}

/// Scheduled delay: nominal plus uniform jitter in `[0, JITTER_MS)`,
/// so simultaneous failures do not retry in lockstep.
pub(crate) fn retry_delay(attempt: u32) -> Duration {
    nominal_delay(attempt) + Duration::from_millis(rand::rng().random_range(0..JITTER_MS))
}

/// Mutable reconnection state owned by the controller.
///
/// At most one retry timer and one network waiter are alive at a time;
/// spawning a new one always invalidates the old one first. The epoch
/// counter stamps messages sent by spawned tasks so anything fired
/// before the last invalidation is discarded on arrival.
#[derive(Default)]
pub(crate) struct RestartState {
    attempts: u32,
    epoch: u64,
    timer: Option<JoinHandle<()>>,
    network_waiter: Option<JoinHandle<()>>,
}

impl RestartState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retries consumed in the current outage.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Current epoch; messages stamped with an older value are stale.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    pub fn has_network_waiter(&self) -> bool {
        self.network_waiter.is_some()
    }

    /// Consume the next attempt slot, returning its 1-indexed number.
    pub fn next_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    /// Abort any pending timer and network waiter and bump the epoch.
    pub fn invalidate(&mut self) {
        self.epoch += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        if let Some(waiter) = self.network_waiter.take() {
            waiter.abort();
        }
    }

    /// Invalidate and zero the attempt counter (successful start or
    /// explicit stop).
    pub fn reset(&mut self) {
        self.invalidate();
        self.attempts = 0;
    }

    /// Install the retry timer. Callers invalidate first.
    pub fn set_timer(&mut self, handle: JoinHandle<()>) {
        debug_assert!(self.timer.is_none());
        self.timer = Some(handle);
    }

    /// Install the one-shot network waiter. Callers invalidate first.
    pub fn set_network_waiter(&mut self, handle: JoinHandle<()>) {
        debug_assert!(self.network_waiter.is_none());
        self.network_waiter = Some(handle);
    }
}
