//! # Command Encoder
//!
//! Pure, side-effect-free rendering of steering state and trim adjustments
//! into the wire command strings.

use super::{TrimAdjust, FIELD_SEPARATOR, PARAMS_PREFIX, TRIM_PREFIX};
use crate::input::state::SteeringState;

/// Encode a steering state into a `AT$PARAMS` command string.
///
/// Fields are rendered as plain decimal integers in a fixed,
/// locale-independent form: direction (-1/0/1), throttle percent (0-100),
/// lateral percent (-50..50).
///
/// # Arguments
///
/// * `state` - Steering state to render; in range by construction
///
/// # Examples
///
/// ```
/// use airboat_link::input::state::{Direction, SteeringState};
/// use airboat_link::protocol::encoder::encode_params;
///
/// let mut state = SteeringState::neutral();
/// state.set_direction(Direction::Reverse);
/// state.set_throttle_percent(35);
/// state.set_lateral_percent(-12);
///
/// assert_eq!(encode_params(&state), "AT$PARAMS:-1;35;-12");
/// ```
#[must_use]
pub fn encode_params(state: &SteeringState) -> String {
    format!(
        "{}{}{}{}{}{}",
        PARAMS_PREFIX,
        state.direction().as_i32(),
        FIELD_SEPARATOR,
        state.throttle_percent(),
        FIELD_SEPARATOR,
        state.lateral_percent(),
    )
}

/// Encode a trim adjustment into a `AT$TRIM` command string.
///
/// # Examples
///
/// ```
/// use airboat_link::protocol::encoder::encode_trim;
/// use airboat_link::protocol::TrimAdjust;
///
/// assert_eq!(encode_trim(TrimAdjust::Increase), "AT$TRIM:+");
/// assert_eq!(encode_trim(TrimAdjust::Decrease), "AT$TRIM:-");
/// assert_eq!(encode_trim(TrimAdjust::Reset), "AT$TRIM:0");
/// ```
#[must_use]
pub fn encode_trim(adjust: TrimAdjust) -> String {
    format!("{}{}", TRIM_PREFIX, adjust.symbol())
}
