//! Client library for AGV controllers speaking the vendor's framed JSON
//! protocol over TCP.
//!
//! # Crate Structure
//!
//! - [`transport`]: API ports, endpoints, dialing and connect retry
//! - [`frame`]: 16-byte header codec, blocking reader/writer, async codec
//! - [`client`]: connections, the command channel, operations, push telemetry
//!
//! The most used client types are re-exported at the crate root.

/// Re-export transport types.
pub mod transport {
    pub use robolink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use robolink_frame::*;
}

/// Re-export client types.
pub mod client {
    pub use robolink_client::*;
}

pub use robolink_client::{
    ops, ApiPort, ClientError, Command, CommandChannel, ConfigurePush, Connection,
    ConnectionConfig, Endpoint, Operation, Outcome, PushListener, RetryPolicy, StatusReport,
    StatusSequencer,
};
