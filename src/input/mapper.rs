//! # Input Mapper Module
//!
//! Folds raw input events from both sources into the one authoritative
//! [`SteeringState`].
//!
//! ## Sources
//!
//! - **Pads**: two on-screen two-axis pads reporting `(angle, strength)`
//!   moves. The steering pad drives the rudder, the throttle pad drives
//!   throttle and direction.
//! - **Gamepad**: analog motion samples (deadzone-filtered per axis, fixed
//!   fallback order per group) and discrete button presses.
//!
//! The mapper does not arbitrate between sources: both write the same state
//! and the most recent write wins. Events that request something other than
//! a steering update (trim adjustments, session toggle, trim-mode toggle)
//! are returned as a [`SideAction`] for the coordinator to dispatch — the
//! mapper itself performs no I/O.

use tracing::debug;

use super::event::{AxisSample, GamepadButton, GamepadMotion, InputEvent, Pad, PadMove, SideAction};
use super::state::{Direction, SteeringState};
use crate::protocol::TrimAdjust;

/// Throttle change per step-button press, in percent.
pub const THROTTLE_STEP: i32 = 10;

/// Throttle preset of the low accelerate button, in percent.
pub const THROTTLE_PRESET_LOW: i32 = 10;

/// Throttle preset of the full accelerate button, in percent.
pub const THROTTLE_PRESET_FULL: i32 = 100;

/// Vertical-axis magnitude beyond which the sample drives direction.
pub const DIRECTION_THRESHOLD: f32 = 0.1;

/// Scale from a normalized horizontal axis (-1.0..1.0) to lateral percent.
pub const LATERAL_SCALE: f32 = 50.0;

/// Reduces input events into steering state.
///
/// # Thread Safety
///
/// `InputMapper` is not thread-safe; all events must be marshalled onto the
/// single coordinating context before being applied, which also gives the
/// last-write-wins guarantee between the two sources.
///
/// # Examples
///
/// ```
/// use airboat_link::input::event::{InputEvent, Pad, PadMove};
/// use airboat_link::input::mapper::InputMapper;
/// use airboat_link::input::state::Direction;
///
/// let mut mapper = InputMapper::new();
/// let event = InputEvent::PadMove(PadMove { pad: Pad::Throttle, angle: 90, strength: 80 });
/// mapper.apply(&event, false);
///
/// assert_eq!(mapper.state().direction(), Direction::Forward);
/// assert_eq!(mapper.state().throttle_percent(), 80);
/// ```
#[derive(Debug, Default)]
pub struct InputMapper {
    state: SteeringState,
}

impl InputMapper {
    /// Creates a mapper holding the neutral state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SteeringState::neutral(),
        }
    }

    /// Snapshot of the current steering state.
    #[must_use]
    pub fn state(&self) -> SteeringState {
        self.state
    }

    /// Folds one input event into the steering state.
    ///
    /// Events are applied in arrival order; batched historical samples must
    /// be delivered oldest-first so the final state reflects the newest
    /// sample. Returns a [`SideAction`] when the event routes outside
    /// steering (a trim adjustment while trim mode is on, a session toggle,
    /// or a trim-mode toggle).
    pub fn apply(&mut self, event: &InputEvent, trim_mode: bool) -> Option<SideAction> {
        match event {
            InputEvent::PadMove(pad_move) => {
                self.apply_pad_move(pad_move);
                None
            }
            InputEvent::GamepadMotion(motion) => {
                self.apply_motion(motion);
                None
            }
            InputEvent::GamepadButton(button) => self.apply_button(*button, trim_mode),
        }
    }

    /// Folds a pad move.
    fn apply_pad_move(&mut self, pad_move: &PadMove) {
        debug!(
            "pad move: {:?} angle {} strength {}",
            pad_move.pad, pad_move.angle, pad_move.strength
        );
        let strength = i32::from(pad_move.strength);
        match pad_move.pad {
            Pad::Steering => match pad_move.angle {
                // 0 degrees is right on the pad, 180 is left; any other
                // angle holds the previous rudder value
                0 => self.state.set_lateral_percent(strength / 2),
                180 => self.state.set_lateral_percent(-(strength / 2)),
                _ => {}
            },
            Pad::Throttle => {
                self.state.set_throttle_percent(strength);
                if strength == 0 {
                    self.state.set_direction(Direction::Neutral);
                } else if pad_move.angle == 270 {
                    self.state.set_direction(Direction::Reverse);
                } else {
                    self.state.set_direction(Direction::Forward);
                }
            }
        }
    }

    /// Folds a gamepad analog motion sample.
    ///
    /// The vertical axis only steers direction; throttle magnitude stays
    /// under button control.
    fn apply_motion(&mut self, motion: &GamepadMotion) {
        let horizontal = first_active(&motion.horizontal);
        self.state
            .set_lateral_percent((horizontal * LATERAL_SCALE).round() as i32);

        let vertical = first_active(&motion.vertical);
        if vertical > DIRECTION_THRESHOLD {
            // Stick down pulls the boat into reverse
            self.state.set_direction(Direction::Reverse);
        } else if vertical < -DIRECTION_THRESHOLD {
            self.state.set_direction(Direction::Forward);
        } else if self.state.throttle_percent() == 0 {
            self.state.set_direction(Direction::Neutral);
        }
    }

    /// Folds a gamepad button press.
    fn apply_button(&mut self, button: GamepadButton, trim_mode: bool) -> Option<SideAction> {
        match button {
            GamepadButton::ThrottleUp => {
                if trim_mode {
                    return Some(SideAction::Trim(TrimAdjust::Increase));
                }
                let throttle = i32::from(self.state.throttle_percent());
                self.state.set_throttle_percent(throttle + THROTTLE_STEP);
                self.default_forward_if_idle();
            }
            GamepadButton::ThrottleDown => {
                if trim_mode {
                    return Some(SideAction::Trim(TrimAdjust::Decrease));
                }
                let throttle = i32::from(self.state.throttle_percent());
                self.state.set_throttle_percent(throttle - THROTTLE_STEP);
            }
            GamepadButton::AccelerateLow => {
                self.state.set_throttle_percent(THROTTLE_PRESET_LOW);
                self.default_forward_if_idle();
            }
            GamepadButton::AccelerateFull => {
                self.state.set_throttle_percent(THROTTLE_PRESET_FULL);
                self.default_forward_if_idle();
            }
            GamepadButton::ReverseToggle => {
                let toggled = self.state.direction().toggled();
                self.state.set_direction(toggled);
            }
            GamepadButton::Escape => self.state.stop(),
            GamepadButton::SessionToggle => return Some(SideAction::ToggleConnection),
            GamepadButton::TrimModeToggle => return Some(SideAction::ToggleTrimMode),
        }
        None
    }

    /// A throttle leaving zero while direction is neutral defaults forward.
    fn default_forward_if_idle(&mut self) {
        if self.state.direction() == Direction::Neutral && self.state.throttle_percent() > 0 {
            self.state.set_direction(Direction::Forward);
        }
    }
}

/// First axis in fallback order with a nonzero deadzone-filtered value;
/// 0.0 when every candidate is at rest.
fn first_active(samples: &[AxisSample; 3]) -> f32 {
    for sample in samples {
        let value = sample.filtered();
        if value != 0.0 {
            return value;
        }
    }
    0.0
}
