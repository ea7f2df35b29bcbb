use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use crate::ports::Endpoint;

/// A connected, blocking byte stream to the vehicle.
///
/// Implemented for [`TcpStream`]; tests can supply their own streams through
/// a custom [`Dialer`].
pub trait AgvStream: Read + Write + Send + Sized {
    /// Set read timeout on the underlying socket.
    fn set_read_timeout(&self, timeout: Option<Duration>) -> std::io::Result<()>;

    /// Set write timeout on the underlying socket.
    fn set_write_timeout(&self, timeout: Option<Duration>) -> std::io::Result<()>;

    /// Try to clone this stream (creates a new file descriptor for the same socket).
    fn try_clone(&self) -> std::io::Result<Self>;

    /// Shut down both directions of the socket.
    fn shutdown(&self) -> std::io::Result<()>;
}

impl AgvStream for TcpStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> std::io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> std::io::Result<()> {
        TcpStream::set_write_timeout(self, timeout)
    }

    fn try_clone(&self) -> std::io::Result<Self> {
        TcpStream::try_clone(self)
    }

    fn shutdown(&self) -> std::io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

/// Opens streams to an endpoint. One call is one connect attempt.
pub trait Dialer: Send {
    type Stream: AgvStream;

    /// Attempt a single blocking connect.
    fn dial(
        &mut self,
        endpoint: &Endpoint,
        timeout: Option<Duration>,
    ) -> std::io::Result<Self::Stream>;
}
