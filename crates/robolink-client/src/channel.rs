use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use robolink_frame::{encode, Frame};
use robolink_transport::{ApiPort, Dialer, Endpoint, TcpDialer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::command::{Command, Operation, Outcome};
use crate::connection::{Connection, ConnectionConfig, ConnectionState};
use crate::envelope::Envelope;
use crate::error::{ProtocolError, Result};

/// One synchronous request/reply round trip.
pub trait Exchange {
    /// Send one frame and wait for the next reply frame.
    ///
    /// Replies are paired with requests by order only; `request_id` is
    /// written to the header but never compared against the reply.
    fn exchange(&self, request_id: u16, message_type: u16, payload: Option<&Value>)
        -> Result<Envelope>;
}

/// Request/reply channel over one [`Connection`].
///
/// A mutex around the connection keeps exactly one request outstanding;
/// concurrent callers queue behind it.
pub struct CommandChannel<D: Dialer = TcpDialer> {
    conn: Mutex<Connection<D>>,
}

impl CommandChannel<TcpDialer> {
    /// Connect with an explicit configuration.
    pub fn connect(config: ConnectionConfig) -> Result<Self> {
        Ok(Self::new(Connection::open(config)?))
    }

    /// Connect to `api` on `host` with default settings.
    pub fn open(host: &str, api: ApiPort) -> Result<Self> {
        Self::connect(ConnectionConfig::api(host, api))
    }
}

impl<D: Dialer> CommandChannel<D> {
    /// Wrap a connection. A disconnected one connects on first use.
    pub fn new(connection: Connection<D>) -> Self {
        Self {
            conn: Mutex::new(connection),
        }
    }

    /// Lock the connection. Recovering a lock poisoned mid-exchange drops
    /// the socket; the next request reconnects.
    fn lock(&self) -> MutexGuard<'_, Connection<D>> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                let mut guard = poisoned.into_inner();
                warn!(endpoint = %guard.endpoint(), "lock poisoned; dropping connection");
                guard.close();
                self.conn.clear_poison();
                guard
            }
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        self.lock().endpoint().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.lock().state()
    }

    /// Bound how long an exchange waits for its reply. `None` waits forever.
    pub fn set_request_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.lock().set_read_timeout(timeout)
    }

    pub fn close(&self) {
        self.lock().close();
    }

    pub fn into_connection(self) -> Connection<D> {
        match self.conn.into_inner() {
            Ok(conn) => conn,
            Err(poisoned) => {
                let mut conn = poisoned.into_inner();
                conn.close();
                conn
            }
        }
    }

    /// Execute `operation` once.
    pub fn call<O: Operation>(&self, operation: O) -> Result<Outcome<O::Output>> {
        Command::run(operation, self)
    }

    /// Send raw payload bytes and return the reply frame undecoded.
    pub fn exchange_frame(
        &self,
        request_id: u16,
        message_type: u16,
        payload: Option<&[u8]>,
    ) -> Result<Frame> {
        let wire = encode(request_id, message_type, payload).map_err(ProtocolError::from)?;
        let started = Instant::now();

        let mut conn = self.lock();
        conn.write_frame(&wire)?;
        let frame = match conn.read_frame() {
            Ok(frame) => frame,
            Err(err) if err.is_connection_fault() => {
                warn!(
                    endpoint = %conn.endpoint(),
                    message_type,
                    error = %err,
                    "read failed; resending once"
                );
                conn.write_frame(&wire)?;
                conn.read_frame()?
            }
            Err(err) => return Err(err),
        };

        debug!(
            request_id,
            message_type,
            reply_type = frame.message_type,
            payload_len = frame.payload.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "exchange complete"
        );
        Ok(frame)
    }

    /// Read the next frame without sending anything.
    pub(crate) fn receive_frame(&self) -> Result<Frame> {
        let mut conn = self.lock();
        if !conn.is_connected() {
            conn.connect()?;
        }
        conn.read_frame()
    }

    /// Write a frame without waiting for a reply.
    pub(crate) fn send_frame(&self, wire: &[u8]) -> Result<()> {
        self.lock().write_frame(wire)
    }
}

impl<D: Dialer> Exchange for CommandChannel<D> {
    fn exchange(
        &self,
        request_id: u16,
        message_type: u16,
        payload: Option<&Value>,
    ) -> Result<Envelope> {
        let body = payload.map(serde_json::to_vec).transpose()?;
        let frame = self.exchange_frame(request_id, message_type, body.as_deref())?;
        match Envelope::from_slice(&frame.payload) {
            Ok(envelope) => Ok(envelope),
            Err(err) => {
                self.close();
                Err(err.into())
            }
        }
    }
}
