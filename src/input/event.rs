//! # Input Event Module
//!
//! Tagged union of raw operator input, from either source.
//!
//! Both the on-screen pads and the physical gamepad are reduced to one
//! [`InputEvent`] stream folded through
//! [`InputMapper`](super::mapper::InputMapper). This keeps the mapping logic
//! unit-testable without device I/O: tests construct events directly instead
//! of driving a real input device.
//!
//! ## Pad Coordinate Convention
//!
//! Pad move events use the device convention 0° = right, 90° = up,
//! 180° = left, 270° = down, with strength 0..=100.

use crate::protocol::TrimAdjust;

/// Which on-screen pad produced a move event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pad {
    /// Right-hand pad: rudder deflection.
    Steering,
    /// Left-hand pad: throttle and direction.
    Throttle,
}

/// A move event from one of the two-axis pads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadMove {
    /// Source pad.
    pub pad: Pad,
    /// Deflection angle in degrees (0 = right, 90 = up).
    pub angle: u16,
    /// Deflection strength, 0..=100 (0 = released).
    pub strength: u8,
}

/// One analog axis sample together with its center-dead band.
///
/// `flat` is the device-reported region around center inside which the axis
/// must be treated as exactly zero. A stick at rest does not always report
/// 0.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSample {
    /// Normalized axis value, -1.0..=1.0.
    pub value: f32,
    /// Normalized dead region around center, >= 0.0.
    pub flat: f32,
}

impl AxisSample {
    /// A centered sample with no dead band.
    #[must_use]
    pub fn centered() -> Self {
        Self { value: 0.0, flat: 0.0 }
    }

    /// Deadzone-filtered value: samples inside the flat region are exactly 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use airboat_link::input::event::AxisSample;
    ///
    /// let sample = AxisSample { value: 0.04, flat: 0.05 };
    /// assert_eq!(sample.filtered(), 0.0);
    ///
    /// let sample = AxisSample { value: -0.5, flat: 0.05 };
    /// assert_eq!(sample.filtered(), -0.5);
    /// ```
    #[must_use]
    pub fn filtered(&self) -> f32 {
        if self.value.abs() <= self.flat {
            0.0
        } else {
            self.value
        }
    }
}

/// One gamepad motion sample: every candidate axis, in fallback order.
///
/// The horizontal group is tried X → hat-X → Z, the vertical group
/// Y → hat-Y → RZ; the first axis whose filtered value is nonzero wins for
/// its group. Batched historical samples are delivered as separate events in
/// chronological order, each producing its own mapping update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GamepadMotion {
    /// Rudder candidates in fallback order: X, hat-X, Z.
    pub horizontal: [AxisSample; 3],
    /// Direction candidates in fallback order: Y, hat-Y, RZ.
    pub vertical: [AxisSample; 3],
}

impl GamepadMotion {
    /// A motion sample with every axis at rest.
    #[must_use]
    pub fn centered() -> Self {
        Self {
            horizontal: [AxisSample::centered(); 3],
            vertical: [AxisSample::centered(); 3],
        }
    }
}

/// A discrete gamepad button press (press only; releases and key-repeat are
/// filtered out by the source).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamepadButton {
    /// Step throttle up by 10% (or trim-increase while trim mode is on).
    ThrottleUp,
    /// Step throttle down by 10% (or trim-decrease while trim mode is on).
    ThrottleDown,
    /// Jump to the 10% throttle preset.
    AccelerateLow,
    /// Jump to the 100% throttle preset.
    AccelerateFull,
    /// Flip direction between forward and reverse, never neutral.
    ReverseToggle,
    /// Stop: direction and throttle to neutral.
    Escape,
    /// Connect when disconnected, disconnect when connected.
    SessionToggle,
    /// Flip the trim-mode flag.
    TrimModeToggle,
}

/// Raw input from either source, reconciled by the mapper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A move on one of the on-screen two-axis pads.
    PadMove(PadMove),
    /// A gamepad analog motion sample.
    GamepadMotion(GamepadMotion),
    /// A gamepad button press.
    GamepadButton(GamepadButton),
}

/// An action an input event requests outside the steering state.
///
/// Returned by the mapper so it stays free of session and trim side effects;
/// the coordinator dispatches these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideAction {
    /// Send a discrete trim adjustment.
    Trim(TrimAdjust),
    /// Toggle the link session (connect/disconnect).
    ToggleConnection,
    /// Toggle the trim-mode flag.
    ToggleTrimMode,
}
