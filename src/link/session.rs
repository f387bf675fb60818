//! # Link Session Module
//!
//! Owns the lifecycle of one connection to one addressed endpoint.
//!
//! ## State Machine
//!
//! ```text
//! Idle --connect--> Connecting --success--> Connected
//!                       |                      |
//!                    failure              disconnect
//!                       v                      v
//!                  Disconnected <--------------+
//!                       |
//!                    connect (reconnection allowed)
//!                       v
//!                   Connecting
//! ```
//!
//! `connect()` and `write()` never block the caller: the transport work runs
//! in spawned tasks and completions come back as [`LinkEvent`]s on an mpsc
//! channel the coordinating task consumes. A generation counter stamps every
//! spawned operation so completions that arrive after an intervening
//! `disconnect()` are discarded instead of resurrecting the session.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::transport::{Transport, WriteChannel};
use crate::error::AirboatLinkError;

/// Connection lifecycle states.
///
/// `Idle` and `Disconnected` are both valid "not connected" rest states;
/// no send is attempted from either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Fresh session, never connected.
    Idle,
    /// Connection attempt in flight.
    Connecting,
    /// Link established; the write channel is valid.
    Connected,
    /// Torn down or failed; reconnection is allowed.
    Disconnected,
}

/// Completion of a spawned transport operation, marshalled back to the
/// coordinating task.
pub enum LinkEvent {
    /// The connection attempt produced a write channel.
    ConnectSucceeded {
        generation: u64,
        channel: Arc<dyn WriteChannel>,
    },
    /// The connection attempt failed or timed out.
    ConnectFailed {
        generation: u64,
        error: AirboatLinkError,
    },
    /// One send did not reach the transport.
    WriteFailed {
        generation: u64,
        error: AirboatLinkError,
    },
}

impl std::fmt::Debug for LinkEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkEvent::ConnectSucceeded { generation, .. } => f
                .debug_struct("ConnectSucceeded")
                .field("generation", generation)
                .finish_non_exhaustive(),
            LinkEvent::ConnectFailed { generation, error } => f
                .debug_struct("ConnectFailed")
                .field("generation", generation)
                .field("error", error)
                .finish(),
            LinkEvent::WriteFailed { generation, error } => f
                .debug_struct("WriteFailed")
                .field("generation", generation)
                .field("error", error)
                .finish(),
        }
    }
}

/// One session to one addressed remote endpoint.
///
/// At most one `LinkSession` is live at a time; all methods are called from
/// the single coordinating task, so no locking is needed around the state.
pub struct LinkSession {
    address: String,
    state: SessionState,
    channel: Option<Arc<dyn WriteChannel>>,
    transport: Arc<dyn Transport>,
    events: mpsc::UnboundedSender<LinkEvent>,
    connect_timeout: Duration,
    generation: u64,
}

impl std::fmt::Debug for LinkSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSession")
            .field("address", &self.address)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl LinkSession {
    /// Creates an idle session for the addressed endpoint.
    ///
    /// # Arguments
    ///
    /// * `address` - Opaque endpoint identifier, handed over by selection
    /// * `transport` - Connector used for every attempt
    /// * `connect_timeout` - Upper bound on one connection attempt
    /// * `events` - Channel completions are reported on
    #[must_use]
    pub fn new(
        address: impl Into<String>,
        transport: Arc<dyn Transport>,
        connect_timeout: Duration,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> Self {
        Self {
            address: address.into(),
            state: SessionState::Idle,
            channel: None,
            transport,
            events,
            connect_timeout,
            generation: 0,
        }
    }

    /// Address of the remote endpoint.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a link is established right now.
    ///
    /// Safe to call from the control loop every tick; a plain field read.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// Begins an asynchronous connection attempt.
    ///
    /// No-op while already `Connecting` or `Connected`. The outcome arrives
    /// as a [`LinkEvent`] and must be applied via [`handle_event`].
    ///
    /// [`handle_event`]: LinkSession::handle_event
    pub fn connect(&mut self) {
        if matches!(self.state, SessionState::Connecting | SessionState::Connected) {
            debug!("connect ignored in state {:?}", self.state);
            return;
        }

        self.state = SessionState::Connecting;
        self.generation += 1;
        let generation = self.generation;
        let transport = Arc::clone(&self.transport);
        let address = self.address.clone();
        let events = self.events.clone();
        let connect_timeout = self.connect_timeout;

        info!("connecting to {}", address);
        tokio::spawn(async move {
            let attempt = tokio::time::timeout(connect_timeout, transport.connect(&address)).await;
            let event = match attempt {
                Ok(Ok(channel)) => LinkEvent::ConnectSucceeded { generation, channel },
                Ok(Err(e)) => LinkEvent::ConnectFailed {
                    generation,
                    error: AirboatLinkError::ConnectionFailed {
                        address,
                        reason: e.to_string(),
                    },
                },
                Err(_) => LinkEvent::ConnectFailed {
                    generation,
                    error: AirboatLinkError::ConnectionFailed {
                        address,
                        reason: format!("timed out after {:?}", connect_timeout),
                    },
                },
            };
            // The receiver only disappears on teardown
            let _ = events.send(event);
        });
    }

    /// Applies a completion event to the state machine.
    ///
    /// Completions stamped with an old generation (an intervening
    /// `disconnect()` happened) are discarded.
    pub fn handle_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::ConnectSucceeded { generation, channel } => {
                if generation != self.generation || self.state != SessionState::Connecting {
                    debug!("stale connect success discarded");
                    tokio::spawn(async move { channel.close().await });
                    return;
                }
                info!("connection to {} established", self.address);
                self.channel = Some(channel);
                self.state = SessionState::Connected;
            }
            LinkEvent::ConnectFailed { generation, error } => {
                if generation != self.generation || self.state != SessionState::Connecting {
                    debug!("stale connect failure discarded");
                    return;
                }
                error!("{}", error);
                self.state = SessionState::Disconnected;
            }
            LinkEvent::WriteFailed { generation, error } => {
                if generation != self.generation {
                    debug!("stale write failure discarded");
                    return;
                }
                // One lost send does not tear the session down
                warn!("{}", error);
            }
        }
    }

    /// Tears down the session.
    ///
    /// Idempotent: from `Idle` or `Disconnected` this is a no-op. From
    /// `Connecting` it cancels the attempt (its late completion will be
    /// discarded); from `Connected` it closes the channel.
    pub fn disconnect(&mut self) {
        if !matches!(self.state, SessionState::Connecting | SessionState::Connected) {
            return;
        }

        self.generation += 1;
        if let Some(channel) = self.channel.take() {
            tokio::spawn(async move { channel.close().await });
        }
        self.state = SessionState::Disconnected;
        info!("disconnected from {}", self.address);
    }

    /// Submits one command payload for transmission, fire-and-forget.
    ///
    /// A no-op while not connected (the call sites guard with
    /// [`is_connected`], this guard only backs them up). The write runs in a
    /// spawned task; a failure comes back as [`LinkEvent::WriteFailed`] and
    /// never propagates to the caller.
    ///
    /// [`is_connected`]: LinkSession::is_connected
    pub fn write(&self, payload: Bytes) {
        if !self.is_connected() {
            debug!("write skipped: not connected");
            return;
        }
        let Some(channel) = self.channel.as_ref() else {
            return;
        };

        let channel = Arc::clone(channel);
        let events = self.events.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            if let Err(e) = channel.write(&payload).await {
                let _ = events.send(LinkEvent::WriteFailed {
                    generation,
                    error: AirboatLinkError::WriteFailed(e.to_string()),
                });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::transport::mocks::MockTransport;
    use std::io;

    const TIMEOUT: Duration = Duration::from_millis(200);

    fn session_with(
        transport: MockTransport,
    ) -> (LinkSession, mpsc::UnboundedReceiver<LinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = LinkSession::new("AA:BB:CC:DD:EE:FF", Arc::new(transport), TIMEOUT, tx);
        (session, rx)
    }

    /// Lets spawned fire-and-forget tasks run on the current-thread runtime.
    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    // ==================== Lifecycle Tests ====================

    #[tokio::test]
    async fn test_new_session_is_idle() {
        let (session, _rx) = session_with(MockTransport::new());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.is_connected());
        assert_eq!(session.address(), "AA:BB:CC:DD:EE:FF");
    }

    #[tokio::test]
    async fn test_connect_success_path() {
        let (mut session, mut rx) = session_with(MockTransport::new());

        session.connect();
        assert_eq!(session.state(), SessionState::Connecting);
        assert!(!session.is_connected());

        let event = rx.recv().await.unwrap();
        session.handle_event(event);
        assert_eq!(session.state(), SessionState::Connected);
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn test_connect_failure_reports_once_and_disconnects() {
        let (mut session, mut rx) =
            session_with(MockTransport::failing(io::ErrorKind::ConnectionRefused));

        session.connect();
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, LinkEvent::ConnectFailed { .. }));
        session.handle_event(event);

        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(!session.is_connected());

        // Exactly one completion for the attempt
        settle().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_connect_while_connecting_is_ignored() {
        let transport = MockTransport::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = LinkSession::new("boat", Arc::new(transport.clone()), TIMEOUT, tx);

        session.connect();
        session.connect();
        session.connect();
        let _ = rx.recv().await.unwrap();
        settle().await;
        assert_eq!(transport.connect_count(), 1);
    }

    #[tokio::test]
    async fn test_connect_while_connected_is_ignored() {
        let transport = MockTransport::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = LinkSession::new("boat", Arc::new(transport.clone()), TIMEOUT, tx);

        session.connect();
        let event = rx.recv().await.unwrap();
        session.handle_event(event);
        assert!(session.is_connected());

        session.connect();
        settle().await;
        assert_eq!(transport.connect_count(), 1);
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn test_reconnection_after_disconnect() {
        let (mut session, mut rx) = session_with(MockTransport::new());

        session.connect();
        let event = rx.recv().await.unwrap();
        session.handle_event(event);
        assert!(session.is_connected());

        session.disconnect();
        assert_eq!(session.state(), SessionState::Disconnected);

        session.connect();
        let event = rx.recv().await.unwrap();
        session.handle_event(event);
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let (mut session, mut rx) = session_with(MockTransport::new());

        // From Idle: no-op, stays Idle
        session.disconnect();
        assert_eq!(session.state(), SessionState::Idle);

        session.connect();
        let event = rx.recv().await.unwrap();
        session.handle_event(event);

        session.disconnect();
        session.disconnect();
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_disconnect_closes_channel() {
        let transport = MockTransport::new();
        let channel = transport.channel.clone();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = LinkSession::new("boat", Arc::new(transport), TIMEOUT, tx);

        session.connect();
        let event = rx.recv().await.unwrap();
        session.handle_event(event);

        session.disconnect();
        settle().await;
        assert!(channel.is_closed());
    }

    #[tokio::test]
    async fn test_stale_connect_success_does_not_resurrect() {
        let (mut session, mut rx) = session_with(MockTransport::new());

        session.connect();
        // Operator gives up before the attempt completes
        session.disconnect();
        assert_eq!(session.state(), SessionState::Disconnected);

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, LinkEvent::ConnectSucceeded { .. }));
        session.handle_event(event);

        // The late success must not flip the session back on
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_stale_connect_failure_after_reconnect_is_discarded() {
        let transport = MockTransport::failing(io::ErrorKind::ConnectionRefused);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = LinkSession::new("boat", Arc::new(transport.clone()), TIMEOUT, tx);

        session.connect();
        session.disconnect();

        // Second attempt succeeds
        *transport.connect_error.lock().unwrap() = None;
        session.connect();

        // Two completions are pending: the stale failure and the fresh
        // success; applying both in order must end Connected
        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        session.handle_event(first);
        session.handle_event(second);
        assert!(session.is_connected());
    }

    // ==================== Write Tests ====================

    #[tokio::test]
    async fn test_write_while_disconnected_is_a_silent_noop() {
        let transport = MockTransport::new();
        let channel = transport.channel.clone();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = LinkSession::new("boat", Arc::new(transport), TIMEOUT, tx);

        session.write(Bytes::from_static(b"AT$PARAMS:0;0;0"));
        settle().await;

        // No transport call, no event
        assert!(channel.written_payloads().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_write_reaches_transport_when_connected() {
        let transport = MockTransport::new();
        let channel = transport.channel.clone();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = LinkSession::new("boat", Arc::new(transport), TIMEOUT, tx);

        session.connect();
        let event = rx.recv().await.unwrap();
        session.handle_event(event);

        session.write(Bytes::from_static(b"AT$PARAMS:1;80;0"));
        settle().await;

        assert_eq!(channel.written_strings(), vec!["AT$PARAMS:1;80;0".to_string()]);
    }

    #[tokio::test]
    async fn test_write_failure_reports_but_keeps_session() {
        let transport = MockTransport::new();
        let channel = transport.channel.clone();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = LinkSession::new("boat", Arc::new(transport), TIMEOUT, tx);

        session.connect();
        let event = rx.recv().await.unwrap();
        session.handle_event(event);

        channel.set_write_error(io::ErrorKind::BrokenPipe);
        session.write(Bytes::from_static(b"AT$TRIM:+"));

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, LinkEvent::WriteFailed { .. }));
        session.handle_event(event);

        // Session survives; the next write goes through again
        assert!(session.is_connected());
        channel.clear_write_error();
        session.write(Bytes::from_static(b"AT$TRIM:-"));
        settle().await;
        assert_eq!(channel.written_strings(), vec!["AT$TRIM:-".to_string()]);
    }

    #[tokio::test]
    async fn test_connect_timeout_reports_failure() {
        use super::super::transport::{Transport, WriteChannel};
        use async_trait::async_trait;

        /// Transport that never completes a connection attempt.
        struct StalledTransport;

        #[async_trait]
        impl Transport for StalledTransport {
            async fn connect(&self, _address: &str) -> io::Result<Arc<dyn WriteChannel>> {
                std::future::pending().await
            }
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = LinkSession::new(
            "boat",
            Arc::new(StalledTransport),
            Duration::from_millis(10),
            tx,
        );

        session.connect();
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, LinkEvent::ConnectFailed { .. }));
        session.handle_event(event);
        assert_eq!(session.state(), SessionState::Disconnected);
    }
}
