//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, so an empty file (or an absent section) yields
//! a usable configuration; only the link address has no sensible default and
//! is checked at connect time rather than load time.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::control::DEFAULT_TICK_INTERVAL_MS;
use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub link: LinkConfig,

    #[serde(default)]
    pub control: ControlConfig,

    #[serde(default)]
    pub gamepad: GamepadConfig,
}

/// Link session configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    /// Opaque endpoint address handed to the transport. Empty until an
    /// endpoint has been selected.
    #[serde(default)]
    pub address: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default = "default_log_interval_sends")]
    pub log_interval_sends: u64,
}

/// Gamepad configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GamepadConfig {
    /// Specific evdev device path; empty means auto-detect.
    #[serde(default)]
    pub device_path: String,
}

// Default value functions
fn default_connect_timeout_ms() -> u64 { 5000 }
fn default_tick_interval_ms() -> u64 { DEFAULT_TICK_INTERVAL_MS }
fn default_log_interval_sends() -> u64 { 500 }

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            log_interval_sends: default_log_interval_sends(),
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use airboat_link::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Tick period as a [`Duration`].
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.control.tick_interval_ms)
    }

    /// Connect timeout as a [`Duration`].
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.link.connect_timeout_ms)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.control.tick_interval_ms == 0 || self.control.tick_interval_ms > 1000 {
            return Err(crate::error::AirboatLinkError::Config(
                toml::de::Error::custom("tick_interval_ms must be between 1 and 1000"),
            ));
        }

        if self.control.log_interval_sends == 0 {
            return Err(crate::error::AirboatLinkError::Config(
                toml::de::Error::custom("log_interval_sends must be greater than 0"),
            ));
        }

        if self.link.connect_timeout_ms == 0 || self.link.connect_timeout_ms > 60000 {
            return Err(crate::error::AirboatLinkError::Config(
                toml::de::Error::custom("connect_timeout_ms must be between 1 and 60000"),
            ));
        }

        // The address stays opaque: any non-empty string is the transport's
        // problem, and empty just means nothing has been selected yet

        Ok(())
    }
}
