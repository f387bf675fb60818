//! # Trim Controller Module
//!
//! Owns the trim-mode flag and the three discrete trim actions.
//!
//! Trim is a secondary adjustment channel, mutually exclusive with the
//! periodic steering stream: while the flag is set, the control loop holds
//! its sends and trim commands go out on explicit user action only.
//! Toggling the flag itself sends nothing.

use bytes::Bytes;
use tracing::{debug, info};

use crate::link::session::LinkSession;
use crate::protocol::encoder::encode_trim;
use crate::protocol::TrimAdjust;

/// Trim mode flag plus the discrete adjust actions.
///
/// # Examples
///
/// ```
/// use airboat_link::trim::TrimController;
///
/// let mut trim = TrimController::new();
/// assert!(!trim.is_enabled());
/// trim.set_enabled(true);
/// assert!(trim.is_enabled());
/// ```
#[derive(Debug, Default)]
pub struct TrimController {
    enabled: bool,
}

impl TrimController {
    /// Creates a controller with trim mode off.
    #[must_use]
    pub fn new() -> Self {
        Self { enabled: false }
    }

    /// Whether trim mode is active (steering transmission suspended).
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the trim-mode flag. Sends nothing.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            info!("trim mode {}", if enabled { "enabled" } else { "disabled" });
        }
        self.enabled = enabled;
    }

    /// Flips the trim-mode flag and returns the new value.
    pub fn toggle(&mut self) -> bool {
        self.set_enabled(!self.enabled);
        self.enabled
    }

    /// Sends a trim-increase command if connected.
    pub fn increase(&self, session: &LinkSession) {
        self.send(TrimAdjust::Increase, session);
    }

    /// Sends a trim-decrease command if connected.
    pub fn decrease(&self, session: &LinkSession) {
        self.send(TrimAdjust::Decrease, session);
    }

    /// Sends a trim-reset command if connected.
    pub fn reset(&self, session: &LinkSession) {
        self.send(TrimAdjust::Reset, session);
    }

    /// Sends one trim adjustment, applying it if connected.
    pub fn apply(&self, adjust: TrimAdjust, session: &LinkSession) {
        self.send(adjust, session);
    }

    fn send(&self, adjust: TrimAdjust, session: &LinkSession) {
        if !session.is_connected() {
            debug!("trim {:?} skipped: not connected", adjust);
            return;
        }
        session.write(Bytes::from(encode_trim(adjust)));
    }
}
