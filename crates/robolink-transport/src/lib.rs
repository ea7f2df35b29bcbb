//! TCP transport layer for the AGV control protocol.
//!
//! This is the lowest layer of robolink. It knows nothing about frames:
//! - [`Endpoint`] and [`ApiPort`] name the vehicle's TCP command surfaces
//! - [`AgvStream`] / [`Dialer`] abstract the blocking socket
//! - [`RetryPolicy`] and [`connect_with_retry`] bound connection attempts
//!
//! Everything above builds on the stream handed out by a [`Dialer`].

pub mod error;
pub mod ports;
pub mod retry;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use ports::{ApiPort, Endpoint};
pub use retry::{Backoff, RetryPolicy};
pub use tcp::{connect_with_retry, TcpDialer};
pub use traits::{AgvStream, Dialer};
