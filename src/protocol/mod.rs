//! # Command Protocol Constants and Types
//!
//! Core definitions for the ASCII command protocol spoken to the vehicle.
//!
//! Two command families exist:
//!
//! - `AT$PARAMS:<direction>;<throttle>;<lateral>` — continuous steering,
//!   sent at a fixed cadence while a session is connected.
//! - `AT$TRIM:+` / `AT$TRIM:-` / `AT$TRIM:0` — discrete trim adjustments,
//!   sent on explicit user action while trim mode is active.
//!
//! Commands are plain ASCII with no terminator; the transport layer owns
//! the terminator convention.

pub mod decoder;
pub mod encoder;

use crate::input::state::SteeringState;

/// Prefix of the continuous steering command.
pub const PARAMS_PREFIX: &str = "AT$PARAMS:";

/// Prefix of the discrete trim command.
pub const TRIM_PREFIX: &str = "AT$TRIM:";

/// Separator between the three steering fields.
pub const FIELD_SEPARATOR: char = ';';

/// A discrete trim adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimAdjust {
    /// Nudge trim toward the right, `AT$TRIM:+`.
    Increase,
    /// Nudge trim toward the left, `AT$TRIM:-`.
    Decrease,
    /// Return trim to center, `AT$TRIM:0`.
    Reset,
}

impl TrimAdjust {
    /// Wire symbol for this adjustment.
    ///
    /// # Examples
    ///
    /// ```
    /// use airboat_link::protocol::TrimAdjust;
    ///
    /// assert_eq!(TrimAdjust::Increase.symbol(), '+');
    /// assert_eq!(TrimAdjust::Decrease.symbol(), '-');
    /// assert_eq!(TrimAdjust::Reset.symbol(), '0');
    /// ```
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            TrimAdjust::Increase => '+',
            TrimAdjust::Decrease => '-',
            TrimAdjust::Reset => '0',
        }
    }
}

/// A rendered-to-be protocol command.
///
/// Produced fresh per send and never mutated; encoding cannot fail for
/// in-range steering state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Continuous steering command carrying the sampled state.
    Params(SteeringState),
    /// Discrete trim adjustment.
    Trim(TrimAdjust),
}

impl Command {
    /// Renders the command to its wire string.
    ///
    /// # Examples
    ///
    /// ```
    /// use airboat_link::input::state::{Direction, SteeringState};
    /// use airboat_link::protocol::{Command, TrimAdjust};
    ///
    /// let mut state = SteeringState::neutral();
    /// state.set_direction(Direction::Forward);
    /// state.set_throttle_percent(80);
    /// assert_eq!(Command::Params(state).encode(), "AT$PARAMS:1;80;0");
    /// assert_eq!(Command::Trim(TrimAdjust::Reset).encode(), "AT$TRIM:0");
    /// ```
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Command::Params(state) => encoder::encode_params(state),
            Command::Trim(adjust) => encoder::encode_trim(*adjust),
        }
    }
}
