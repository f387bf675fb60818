//! # Gamepad Source Module
//!
//! Reads a physical gamepad through the Linux evdev interface and turns its
//! raw events into [`InputEvent`]s for the mapper.
//!
//! ## Detection
//!
//! A device counts as a gamepad when it reports gamepad buttons
//! (`BTN_SOUTH`) or a control stick (`ABS_X`). The first matching
//! `/dev/input/event*` device is used unless a path is configured.
//!
//! ## Deadzone Source
//!
//! Per-axis flat regions come from the device's reported absinfo, cached at
//! open time; they travel with every motion sample so the mapper can filter
//! without touching the device.
//!
//! ## Axis Snapshot
//!
//! evdev delivers one event per changed axis; the source keeps the latest
//! raw value per axis and emits a full [`GamepadMotion`] snapshot on every
//! `SYN_REPORT`, so each motion event carries all candidate axes in their
//! fallback order.

use evdev::{AbsInfo, AbsoluteAxisType, Device, InputEventKind, Key};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::event::{AxisSample, GamepadButton, GamepadMotion, InputEvent};
use crate::error::{AirboatLinkError, Result};

/// Reported range and dead region of one absolute axis.
#[derive(Debug, Clone, Copy)]
pub struct AxisRange {
    min: i32,
    max: i32,
    flat: i32,
}

impl Default for AxisRange {
    /// Range of an axis the device never reported: degenerate, so the axis
    /// contributes exactly 0 whatever raw value shows up.
    fn default() -> Self {
        Self { min: 0, max: 0, flat: 0 }
    }
}

impl AxisRange {
    /// Builds a range from device-reported values.
    #[must_use]
    pub fn new(min: i32, max: i32, flat: i32) -> Self {
        Self { min, max, flat: flat.abs() }
    }

    /// Normalizes a raw axis value into -1.0..=1.0.
    ///
    /// A degenerate range (min >= max) degrades to 0.0 rather than faulting.
    ///
    /// # Examples
    ///
    /// ```
    /// use airboat_link::input::gamepad::AxisRange;
    ///
    /// let range = AxisRange::new(0, 255, 15);
    /// assert!((range.normalize(255) - 1.0).abs() < 0.01);
    /// assert!((range.normalize(0) + 1.0).abs() < 0.01);
    /// assert!(range.normalize(128).abs() < 0.01);
    /// ```
    #[must_use]
    pub fn normalize(&self, raw: i32) -> f32 {
        let span = (self.max - self.min) as f32;
        if span <= 0.0 {
            return 0.0;
        }
        let centered = (raw - self.min) as f32 / span * 2.0 - 1.0;
        centered.clamp(-1.0, 1.0)
    }

    /// The flat region scaled into the normalized coordinate space.
    #[must_use]
    pub fn normalized_flat(&self) -> f32 {
        let half_span = (self.max - self.min) as f32 / 2.0;
        if half_span <= 0.0 {
            0.0
        } else {
            self.flat as f32 / half_span
        }
    }

    /// One normalized sample with its dead band.
    #[must_use]
    pub fn sample(&self, raw: i32) -> AxisSample {
        AxisSample {
            value: self.normalize(raw),
            flat: self.normalized_flat(),
        }
    }
}

/// Latest raw value per tracked axis.
#[derive(Debug, Default, Clone, Copy)]
struct RawAxes {
    x: i32,
    y: i32,
    z: i32,
    rz: i32,
    hat_x: i32,
    hat_y: i32,
}

/// Reported ranges per tracked axis.
#[derive(Debug, Default, Clone, Copy)]
struct AxisRanges {
    x: AxisRange,
    y: AxisRange,
    z: AxisRange,
    rz: AxisRange,
    hat_x: AxisRange,
    hat_y: AxisRange,
}

/// An opened gamepad device feeding the input channel.
pub struct GamepadSource {
    device: Device,
    device_path: String,
    ranges: AxisRanges,
    raw: RawAxes,
}

impl std::fmt::Debug for GamepadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GamepadSource")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl GamepadSource {
    /// Detects and opens the first available gamepad.
    ///
    /// Scans `/dev/input/event*` in sorted order for a device with gamepad
    /// buttons or a control stick.
    ///
    /// # Errors
    ///
    /// Returns [`AirboatLinkError::Gamepad`] when no gamepad is present or
    /// `/dev/input` cannot be read.
    pub fn open() -> Result<Self> {
        let input_dir = Path::new("/dev/input");
        if !input_dir.exists() {
            return Err(AirboatLinkError::Gamepad(
                "/dev/input directory not found".to_string(),
            ));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| AirboatLinkError::Gamepad(format!("failed to read /dev/input: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AirboatLinkError::Gamepad(format!("failed to read directory entry: {}", e)))?;

        // Sorted for a deterministic pick when several devices are present
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();
            let Some(filename) = path.file_name() else { continue };
            if !filename.to_string_lossy().starts_with("event") {
                continue;
            }

            match Device::open(&path) {
                Ok(device) if is_game_controller(&device) => {
                    info!(
                        "found gamepad {:?} at {}",
                        device.name().unwrap_or("unknown"),
                        path.display()
                    );
                    return Self::from_device(device, path.to_string_lossy().to_string());
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(AirboatLinkError::Gamepad("no gamepad found".to_string()))
    }

    /// Opens a specific evdev device path.
    ///
    /// # Errors
    ///
    /// Returns [`AirboatLinkError::Gamepad`] when the device cannot be
    /// opened or is not a game controller.
    pub fn open_path(path: &str) -> Result<Self> {
        let device = Device::open(path)
            .map_err(|e| AirboatLinkError::Gamepad(format!("failed to open {}: {}", path, e)))?;
        if !is_game_controller(&device) {
            return Err(AirboatLinkError::Gamepad(format!(
                "{} is not a game controller",
                path
            )));
        }
        Self::from_device(device, path.to_string())
    }

    fn from_device(device: Device, device_path: String) -> Result<Self> {
        let mut ranges = AxisRanges::default();
        let mut raw = RawAxes::default();

        let absinfo: Vec<(AbsoluteAxisType, AbsInfo)> =
            match (device.supported_absolute_axes(), device.get_abs_state()) {
                (Some(axes), Ok(state)) => axes
                    .iter()
                    .map(|axis| {
                        let r = state[axis.0 as usize];
                        (
                            axis,
                            AbsInfo::new(
                                r.value, r.minimum, r.maximum, r.fuzz, r.flat, r.resolution,
                            ),
                        )
                    })
                    .collect(),
                _ => Vec::new(),
            };
        for (axis, info) in absinfo {
            let range = AxisRange::new(info.minimum(), info.maximum(), info.flat());
            match axis {
                AbsoluteAxisType::ABS_X => {
                    ranges.x = range;
                    raw.x = info.value();
                }
                AbsoluteAxisType::ABS_Y => {
                    ranges.y = range;
                    raw.y = info.value();
                }
                AbsoluteAxisType::ABS_Z => {
                    ranges.z = range;
                    raw.z = info.value();
                }
                AbsoluteAxisType::ABS_RZ => {
                    ranges.rz = range;
                    raw.rz = info.value();
                }
                AbsoluteAxisType::ABS_HAT0X => {
                    ranges.hat_x = range;
                    raw.hat_x = info.value();
                }
                AbsoluteAxisType::ABS_HAT0Y => {
                    ranges.hat_y = range;
                    raw.hat_y = info.value();
                }
                _ => {}
            }
        }

        Ok(Self {
            device,
            device_path,
            ranges,
            raw,
        })
    }

    /// Path of the opened device.
    #[must_use]
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Moves the source onto a reader thread feeding the input channel.
    ///
    /// The thread ends when the device goes away or the receiving side of
    /// the channel is dropped.
    pub fn spawn(mut self, events: mpsc::UnboundedSender<InputEvent>) -> std::thread::JoinHandle<()> {
        std::thread::spawn(move || loop {
            let batch: Vec<evdev::InputEvent> = match self.device.fetch_events() {
                Ok(iter) => iter.collect(),
                Err(e) => {
                    warn!("gamepad {} read failed: {}", self.device_path, e);
                    return;
                }
            };
            for event in batch {
                if let Some(mapped) = self.process(&event) {
                    if events.send(mapped).is_err() {
                        // Coordinator is gone; stop reading
                        return;
                    }
                }
            }
        })
    }

    /// Translates one raw evdev event; `None` when it carries nothing for
    /// the mapper (axis cache updates, releases, key-repeat, unknown keys).
    fn process(&mut self, event: &evdev::InputEvent) -> Option<InputEvent> {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => {
                self.update_axis(axis, event.value());
                None
            }
            // A sync closes one batch of axis updates: emit the snapshot
            InputEventKind::Synchronization(_) => {
                Some(InputEvent::GamepadMotion(self.motion_snapshot()))
            }
            InputEventKind::Key(key) if event.value() == 1 => {
                map_button(key).map(InputEvent::GamepadButton)
            }
            _ => None,
        }
    }

    fn update_axis(&mut self, axis: AbsoluteAxisType, value: i32) {
        match axis {
            AbsoluteAxisType::ABS_X => self.raw.x = value,
            AbsoluteAxisType::ABS_Y => self.raw.y = value,
            AbsoluteAxisType::ABS_Z => self.raw.z = value,
            AbsoluteAxisType::ABS_RZ => self.raw.rz = value,
            AbsoluteAxisType::ABS_HAT0X => self.raw.hat_x = value,
            AbsoluteAxisType::ABS_HAT0Y => self.raw.hat_y = value,
            _ => {}
        }
    }

    /// Current axes as one motion sample, candidates in fallback order.
    fn motion_snapshot(&self) -> GamepadMotion {
        GamepadMotion {
            horizontal: [
                self.ranges.x.sample(self.raw.x),
                self.ranges.hat_x.sample(self.raw.hat_x),
                self.ranges.z.sample(self.raw.z),
            ],
            vertical: [
                self.ranges.y.sample(self.raw.y),
                self.ranges.hat_y.sample(self.raw.hat_y),
                self.ranges.rz.sample(self.raw.rz),
            ],
        }
    }
}

/// Whether a device has gamepad buttons or a control stick.
fn is_game_controller(device: &Device) -> bool {
    let has_gamepad_buttons = device
        .supported_keys()
        .map(|keys| keys.contains(Key::BTN_SOUTH))
        .unwrap_or(false);
    let has_stick = device
        .supported_absolute_axes()
        .map(|axes| axes.contains(AbsoluteAxisType::ABS_X))
        .unwrap_or(false);
    has_gamepad_buttons || has_stick
}

/// Maps an evdev key to its control meaning; unknown keys are dropped.
#[must_use]
pub fn map_button(key: Key) -> Option<GamepadButton> {
    match key {
        Key::BTN_NORTH => Some(GamepadButton::ThrottleUp),
        Key::BTN_WEST => Some(GamepadButton::ThrottleDown),
        Key::BTN_SOUTH => Some(GamepadButton::AccelerateLow),
        Key::BTN_EAST => Some(GamepadButton::AccelerateFull),
        Key::BTN_SELECT => Some(GamepadButton::ReverseToggle),
        Key::BTN_START => Some(GamepadButton::SessionToggle),
        Key::BTN_MODE | Key::KEY_BACK => Some(GamepadButton::Escape),
        Key::BTN_THUMBL => Some(GamepadButton::TrimModeToggle),
        _ => None,
    }
}
