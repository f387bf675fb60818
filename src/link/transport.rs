//! Trait abstraction for the wireless transport to enable testing.
//!
//! The core only ever consumes this narrow surface: connect to an opaque
//! address, write bytes on the resulting channel, close it. Scanning and
//! endpoint selection happen outside the core and hand in the address.

use async_trait::async_trait;
use std::io;
use std::sync::Arc;

/// The write half of an established link.
///
/// Valid only while the owning session is connected; the session drops its
/// reference on disconnect.
#[async_trait]
pub trait WriteChannel: Send + Sync {
    /// Write one complete command to the remote end.
    ///
    /// The transport owns the terminator convention; callers pass the bare
    /// command bytes.
    async fn write(&self, payload: &[u8]) -> io::Result<()>;

    /// Tear the channel down. Best-effort; errors are swallowed.
    async fn close(&self);
}

/// A connector for one kind of link (TCP bridge, BLE GATT, ...).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish a connection to the addressed endpoint.
    ///
    /// The address is opaque to the core; each transport defines its own
    /// format.
    async fn connect(&self, address: &str) -> io::Result<Arc<dyn WriteChannel>>;
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Mock write channel recording every payload.
    #[derive(Clone)]
    pub struct MockWriteChannel {
        pub written: Arc<Mutex<Vec<Vec<u8>>>>,
        pub write_error: Arc<Mutex<Option<io::ErrorKind>>>,
        pub closed: Arc<Mutex<bool>>,
    }

    impl MockWriteChannel {
        pub fn new() -> Self {
            Self {
                written: Arc::new(Mutex::new(Vec::new())),
                write_error: Arc::new(Mutex::new(None)),
                closed: Arc::new(Mutex::new(false)),
            }
        }

        pub fn written_payloads(&self) -> Vec<Vec<u8>> {
            self.written.lock().unwrap().clone()
        }

        pub fn written_strings(&self) -> Vec<String> {
            self.written_payloads()
                .into_iter()
                .map(|bytes| String::from_utf8(bytes).unwrap())
                .collect()
        }

        pub fn set_write_error(&self, error: io::ErrorKind) {
            *self.write_error.lock().unwrap() = Some(error);
        }

        pub fn clear_write_error(&self) {
            *self.write_error.lock().unwrap() = None;
        }

        pub fn is_closed(&self) -> bool {
            *self.closed.lock().unwrap()
        }
    }

    #[async_trait]
    impl WriteChannel for MockWriteChannel {
        async fn write(&self, payload: &[u8]) -> io::Result<()> {
            if let Some(error) = *self.write_error.lock().unwrap() {
                return Err(io::Error::new(error, "mock write error"));
            }
            self.written.lock().unwrap().push(payload.to_vec());
            Ok(())
        }

        async fn close(&self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    /// Mock transport handing out a shared [`MockWriteChannel`].
    #[derive(Clone)]
    pub struct MockTransport {
        pub channel: MockWriteChannel,
        pub connect_error: Arc<Mutex<Option<io::ErrorKind>>>,
        pub connect_count: Arc<Mutex<usize>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self {
                channel: MockWriteChannel::new(),
                connect_error: Arc::new(Mutex::new(None)),
                connect_count: Arc::new(Mutex::new(0)),
            }
        }

        pub fn failing(error: io::ErrorKind) -> Self {
            let transport = Self::new();
            *transport.connect_error.lock().unwrap() = Some(error);
            transport
        }

        pub fn connect_count(&self) -> usize {
            *self.connect_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn connect(&self, _address: &str) -> io::Result<Arc<dyn WriteChannel>> {
            *self.connect_count.lock().unwrap() += 1;
            if let Some(error) = *self.connect_error.lock().unwrap() {
                return Err(io::Error::new(error, "mock connect error"));
            }
            Ok(Arc::new(self.channel.clone()))
        }
    }

    #[tokio::test]
    async fn test_mock_channel_records_writes() {
        let channel = MockWriteChannel::new();
        channel.write(b"AT$TRIM:0").await.unwrap();
        assert_eq!(channel.written_strings(), vec!["AT$TRIM:0".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_channel_injected_error() {
        let channel = MockWriteChannel::new();
        channel.set_write_error(io::ErrorKind::BrokenPipe);
        assert!(channel.write(b"x").await.is_err());
        assert!(channel.written_payloads().is_empty());
    }

    #[tokio::test]
    async fn test_mock_transport_counts_connects() {
        let transport = MockTransport::new();
        let _ = transport.connect("boat").await.unwrap();
        let _ = transport.connect("boat").await.unwrap();
        assert_eq!(transport.connect_count(), 2);
    }
}
