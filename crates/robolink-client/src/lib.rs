//! Blocking request/reply client for AGV controllers.
//!
//! Built on [`robolink_transport`] sockets and [`robolink_frame`] framing:
//! - [`Connection`] owns one socket, reconnecting after faults
//! - [`CommandChannel`] serializes exchanges so one request is outstanding
//! - [`Operation`] schemas in [`ops`] run through the generic [`Command`]
//! - [`StatusSequencer`] polls every status query in one pass
//! - [`PushListener`] receives telemetry on its own connection
//!
//! ```no_run
//! use robolink_client::ops::GotoStation;
//! use robolink_client::{ApiPort, CommandChannel, Outcome};
//!
//! # fn main() -> robolink_client::Result<()> {
//! let channel = CommandChannel::open("192.168.0.10", ApiPort::Task)?;
//! match channel.call(GotoStation::new("LM15").with_max_speed(0.5))? {
//!     Outcome::Success(_) => println!("task accepted"),
//!     Outcome::Failure(err) => println!("rejected: {err}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod codes;
pub mod command;
pub mod connection;
pub mod envelope;
pub mod error;
pub mod ops;
pub mod push;
pub mod sequencer;

#[cfg(test)]
mod testing;

pub use channel::{CommandChannel, Exchange};
pub use codes::{BlockReason, TaskStatus, TaskType, UNKNOWN_LABEL};
pub use command::{Ack, ApplicationError, Command, CommandState, Execute, Operation, Outcome};
pub use connection::{Connection, ConnectionConfig, ConnectionState, DEFAULT_CONNECT_TIMEOUT};
pub use envelope::Envelope;
pub use error::{ClientError, ProtocolError, Result, ValidationError};
pub use push::{ConfigurePush, PushListener, PushMessage, DEFAULT_PUSH_FIELDS};
pub use sequencer::{BatchFailure, BatchSummary, StatusReport, StatusSequencer};

pub use robolink_transport::{ApiPort, Endpoint, RetryPolicy};
