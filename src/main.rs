//! # Airboat Link
//!
//! Drive an RC airboat with a gamepad over a session-oriented wireless link.
//!
//! The binary wires the library together: it loads the configuration,
//! connects to the configured endpoint, reads a gamepad, and runs the
//! control loop that streams `AT$PARAMS` commands at a fixed cadence while
//! a session is connected and trim mode is off.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Set up logging with tracing subscriber
//!    - Load configuration (path from the first CLI argument)
//!    - Open the gamepad and start its reader thread
//!    - Begin connecting to the configured endpoint
//!
//! 2. **Main Loop** (single task; every shared-state mutation happens here)
//!    - On each tick: sample the steering state and transmit if allowed
//!    - On input events: fold them into the steering state, dispatch
//!      side actions (trim adjust, session toggle, trim-mode toggle)
//!    - On link events: advance the session state machine
//!    - Handle Ctrl+C for graceful shutdown
//!
//! 3. **Graceful Shutdown**
//!    - Stop ticking, tear down the session, log totals

use anyhow::{bail, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use airboat_link::config::Config;
use airboat_link::control::ControlLoop;
use airboat_link::input::event::SideAction;
use airboat_link::input::gamepad::GamepadSource;
use airboat_link::input::InputMapper;
use airboat_link::link::{LinkSession, TcpTransport};
use airboat_link::trim::TrimController;

/// Configuration file used when no path is given on the command line.
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Airboat Link v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)?;
    info!("configuration loaded from {}", config_path);

    if config.link.address.is_empty() {
        bail!("no endpoint configured; set [link] address in {}", config_path);
    }

    // Input events from the gamepad reader thread; the local sender keeps
    // the channel open for further sources (an on-screen pad UI feeds the
    // same channel)
    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    let gamepad = if config.gamepad.device_path.is_empty() {
        GamepadSource::open()
    } else {
        GamepadSource::open_path(&config.gamepad.device_path)
    };
    match gamepad {
        Ok(source) => {
            info!("gamepad ready at {}", source.device_path());
            // Detached: the thread ends when the channel closes
            let _ = source.spawn(input_tx.clone());
        }
        Err(e) => warn!("continuing without gamepad: {}", e),
    }

    let (link_tx, mut link_rx) = mpsc::unbounded_channel();
    let mut session = LinkSession::new(
        config.link.address.clone(),
        Arc::new(TcpTransport::new()),
        config.connect_timeout(),
        link_tx,
    );
    let mut mapper = InputMapper::new();
    let mut trim = TrimController::new();
    let mut control = ControlLoop::new(config.tick_interval(), config.control.log_interval_sends);

    // The configured address is the selection handoff; connect right away
    session.connect();

    info!(
        "control loop running at {} ms period",
        config.control.tick_interval_ms
    );
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            // Transmit whatever is current, if connected and not trimming
            _ = control.tick() => {
                control.drive(&mapper, &trim, &session);
            }

            // Operator input, marshalled here from the reader thread
            Some(event) = input_rx.recv() => {
                if let Some(action) = mapper.apply(&event, trim.is_enabled()) {
                    dispatch_side_action(action, &mut trim, &mut session);
                }
            }

            // Transport completions, marshalled here from spawned tasks
            Some(event) = link_rx.recv() => {
                session.handle_event(event);
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    session.disconnect();
    info!(
        "stopped after {} ticks, {} steering commands sent",
        control.ticks(),
        control.sent()
    );

    Ok(())
}

/// Routes a mapper side action to the session or trim controller.
fn dispatch_side_action(action: SideAction, trim: &mut TrimController, session: &mut LinkSession) {
    match action {
        SideAction::Trim(adjust) => trim.apply(adjust, session),
        SideAction::ToggleConnection => {
            if session.is_connected() {
                session.disconnect();
            } else {
                session.connect();
            }
        }
        SideAction::ToggleTrimMode => {
            trim.toggle();
        }
    }
}
