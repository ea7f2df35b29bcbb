use std::time::Duration;

use bytes::Bytes;
use robolink_frame::{Frame, FrameConfig, FrameError, FrameReader, FrameWriter};
use robolink_transport::{
    connect_with_retry, AgvStream, ApiPort, Dialer, Endpoint, RetryPolicy, TcpDialer,
    TransportError,
};
use tracing::{debug, warn};

use crate::error::{classify_frame_error, ClientError, Result};

/// Default bound on a single TCP connect attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Configuration for one vehicle connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Where to connect.
    pub endpoint: Endpoint,
    /// Attempt budget and backoff for `connect()`.
    pub retry: RetryPolicy,
    /// Bound on a single connect attempt. `None` blocks on the OS default.
    pub connect_timeout: Option<Duration>,
    /// Payload limit and socket read/write timeouts.
    pub frame: FrameConfig,
}

impl ConnectionConfig {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            retry: RetryPolicy::default(),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            frame: FrameConfig::default(),
        }
    }

    /// Config for a named surface on `host`.
    pub fn api(host: impl Into<String>, api: ApiPort) -> Self {
        Self::new(Endpoint::api(host, api))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Bound on waiting for a reply. Expiry aborts the exchange and drops the socket.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.frame.read_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.frame.write_timeout = timeout;
        self
    }
}

struct Link<S> {
    reader: FrameReader<S>,
    writer: FrameWriter<S>,
}

/// One TCP socket to one vehicle surface.
///
/// Owns the stream exclusively. Any I/O fault drops the socket and moves the
/// connection to [`ConnectionState::Disconnected`]; the next write reconnects.
/// The socket is shut down on `close()` and on drop.
pub struct Connection<D: Dialer = TcpDialer> {
    config: ConnectionConfig,
    dialer: D,
    link: Option<Link<D::Stream>>,
    state: ConnectionState,
}

impl Connection<TcpDialer> {
    /// Create a disconnected TCP connection.
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_dialer(config, TcpDialer)
    }

    /// Create and connect a TCP connection.
    pub fn open(config: ConnectionConfig) -> Result<Self> {
        let mut conn = Self::new(config);
        conn.connect()?;
        Ok(conn)
    }
}

impl<D: Dialer> Connection<D> {
    /// Create a disconnected connection that dials through `dialer`.
    pub fn with_dialer(config: ConnectionConfig, dialer: D) -> Self {
        Self {
            config,
            dialer,
            link: None,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.config.endpoint
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Establish the socket, retrying per the configured policy.
    ///
    /// A no-op when already connected. Fails with
    /// [`ClientError::Connection`] once the attempt budget is spent.
    pub fn connect(&mut self) -> Result<()> {
        if self.link.is_some() {
            return Ok(());
        }

        self.state = ConnectionState::Connecting;
        let stream = match connect_with_retry(
            &mut self.dialer,
            &self.config.endpoint,
            &self.config.retry,
            self.config.connect_timeout,
        ) {
            Ok(stream) => stream,
            Err(err) => {
                self.state = ConnectionState::Disconnected;
                return Err(err.into());
            }
        };

        match self.attach(stream) {
            Ok(link) => {
                self.link = Some(link);
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Err(err) => {
                self.state = ConnectionState::Disconnected;
                Err(TransportError::Io(err).into())
            }
        }
    }

    fn attach(&self, stream: D::Stream) -> std::io::Result<Link<D::Stream>> {
        stream.set_read_timeout(self.config.frame.read_timeout)?;
        stream.set_write_timeout(self.config.frame.write_timeout)?;
        let reader_stream = stream.try_clone()?;
        Ok(Link {
            reader: FrameReader::with_config(reader_stream, self.config.frame.clone()),
            writer: FrameWriter::with_config(stream, self.config.frame.clone()),
        })
    }

    /// Shut down and release the socket. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(link) = self.link.take() {
            if let Err(err) = link.writer.get_ref().shutdown() {
                debug!(endpoint = %self.config.endpoint, error = %err, "socket shutdown failed");
            }
            debug!(endpoint = %self.config.endpoint, "connection closed");
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Write one encoded frame in full.
    ///
    /// Connects first when disconnected. On a write fault the socket is
    /// dropped, `connect()` runs once more and the write is retried once; a
    /// second failure is returned as [`ClientError::Connection`].
    pub fn write_frame(&mut self, wire: &[u8]) -> Result<()> {
        if self.link.is_none() {
            debug!(endpoint = %self.config.endpoint, "not connected; connecting before write");
            self.connect()?;
        }

        if let Err(err) = self.try_write(wire) {
            warn!(endpoint = %self.config.endpoint, error = %err, "write failed; reconnecting");
            self.close();
            self.connect()?;
            if let Err(err) = self.try_write(wire) {
                self.close();
                return Err(write_fault(err));
            }
        }
        Ok(())
    }

    fn try_write(&mut self, wire: &[u8]) -> std::result::Result<(), FrameError> {
        match self.link.as_mut() {
            Some(link) => link.writer.write_encoded(wire),
            None => Err(FrameError::Io(std::io::Error::from(
                std::io::ErrorKind::NotConnected,
            ))),
        }
    }

    /// Read precisely `n` bytes from the socket.
    pub fn read_exact(&mut self, n: usize) -> Result<Bytes> {
        let read_timeout = self.config.frame.read_timeout;
        let link = self
            .link
            .as_mut()
            .ok_or(ClientError::Connection(TransportError::NotConnected))?;
        match link.reader.read_exact(n) {
            Ok(bytes) => Ok(bytes),
            Err(err) => {
                self.close();
                Err(classify_frame_error(err, read_timeout))
            }
        }
    }

    /// Read one complete frame: 16 header bytes, then exactly the declared payload.
    ///
    /// Any failure, including a timeout, drops the socket.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let read_timeout = self.config.frame.read_timeout;
        let link = self
            .link
            .as_mut()
            .ok_or(ClientError::Connection(TransportError::NotConnected))?;
        match link.reader.read_frame() {
            Ok(frame) => Ok(frame),
            Err(err) => {
                self.close();
                Err(classify_frame_error(err, read_timeout))
            }
        }
    }

    /// Change the reply timeout, applying it to the live socket if any.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.config.frame.read_timeout = timeout;
        if let Some(link) = self.link.as_ref() {
            link.reader
                .get_ref()
                .set_read_timeout(timeout)
                .map_err(TransportError::Io)?;
        }
        Ok(())
    }
}

impl<D: Dialer> Drop for Connection<D> {
    fn drop(&mut self) {
        self.close();
    }
}

fn write_fault(err: FrameError) -> ClientError {
    match err {
        FrameError::Io(io) => ClientError::Connection(TransportError::Io(io)),
        FrameError::ConnectionClosed { .. } => ClientError::Connection(TransportError::Closed),
        other => ClientError::Protocol(other.into()),
    }
}
