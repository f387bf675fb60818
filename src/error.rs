//! # Error Types
//!
//! Custom error types for Airboat Link using `thiserror`.

use thiserror::Error;

/// Main error type for Airboat Link
#[derive(Debug, Error)]
pub enum AirboatLinkError {
    /// A connection attempt did not complete. Recoverable: the session
    /// returns to `Disconnected` and a new attempt may be started.
    #[error("connection to {address} failed: {reason}")]
    ConnectionFailed { address: String, reason: String },

    /// A single send did not reach the transport. Recoverable: the session
    /// stays up and the control loop keeps ticking.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Send attempted while no session is connected. Suppressed at call
    /// sites behind the `is_connected()` guard; only surfaces from misuse.
    #[error("not connected")]
    NotConnected,

    /// Command protocol errors (malformed command text)
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Gamepad device errors
    #[error("gamepad error: {0}")]
    Gamepad(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Airboat Link
pub type Result<T> = std::result::Result<T, AirboatLinkError>;
