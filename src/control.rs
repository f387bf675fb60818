//! # Control Loop Module
//!
//! The fixed-rate transmitter: every tick, sample the current steering
//! state and push one `AT$PARAMS` command down the link.
//!
//! ## Tick Semantics
//!
//! - The period is fixed at startup (60 ms by default).
//! - A tick is a no-op (apart from rescheduling) while trim mode is on or
//!   no session is connected.
//! - Sends are fire-and-forget; a failure never stops future ticks.
//! - No coalescing: whatever state is current goes out, and states
//!   superseded between ticks simply never reach the wire.
//!
//! The interval uses [`MissedTickBehavior::Delay`], so a late tick pushes
//! the schedule back instead of bursting — the loop is never reentrant and
//! its liveness never depends on link health.

use bytes::Bytes;
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::input::mapper::InputMapper;
use crate::link::session::LinkSession;
use crate::protocol::encoder::encode_params;
use crate::trim::TrimController;

/// Default transmit period in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 60;

/// The periodic steering transmitter.
///
/// # Examples
///
/// ```no_run
/// use airboat_link::control::ControlLoop;
/// use std::time::Duration;
///
/// let mut control = ControlLoop::new(Duration::from_millis(60), 500);
/// # async {
/// control.tick().await; // completes on the next period boundary
/// # };
/// ```
pub struct ControlLoop {
    interval: Interval,
    period: Duration,
    ticks: u64,
    sent: u64,
    last_logged: u64,
    log_interval: u64,
}

impl std::fmt::Debug for ControlLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlLoop")
            .field("period", &self.period)
            .field("ticks", &self.ticks)
            .field("sent", &self.sent)
            .finish_non_exhaustive()
    }
}

impl ControlLoop {
    /// Creates a loop with the given period.
    ///
    /// # Arguments
    ///
    /// * `period` - Time between ticks
    /// * `log_interval` - Sends between status log lines
    #[must_use]
    pub fn new(period: Duration, log_interval: u64) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            period,
            ticks: 0,
            sent: 0,
            last_logged: 0,
            log_interval,
        }
    }

    /// The configured period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ticks elapsed since start.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Steering commands submitted since start.
    #[must_use]
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Waits for the next period boundary.
    ///
    /// Always reschedules; never contingent on anything but time.
    pub async fn tick(&mut self) {
        self.interval.tick().await;
        self.ticks += 1;
    }

    /// Runs one tick's work: gate, sample, encode, submit.
    ///
    /// Returns whether a steering command was submitted. No command goes
    /// out while trim mode is enabled or the session is not connected.
    pub fn drive(
        &mut self,
        mapper: &InputMapper,
        trim: &TrimController,
        session: &LinkSession,
    ) -> bool {
        if trim.is_enabled() || !session.is_connected() {
            debug!(
                "tick skipped (trim {}, connected {})",
                trim.is_enabled(),
                session.is_connected()
            );
            return false;
        }

        let state = mapper.state();
        let command = encode_params(&state);
        session.write(Bytes::from(command));
        self.sent += 1;

        if self.sent - self.last_logged >= self.log_interval {
            info!(
                "sent {} steering commands ({} ms period)",
                self.sent,
                self.period.as_millis()
            );
            self.last_logged = self.sent;
        }
        true
    }
}
