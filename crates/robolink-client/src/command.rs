use robolink_transport::ApiPort;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::channel::Exchange;
use crate::envelope::Envelope;
use crate::error::{ClientError, ProtocolError, Result, ValidationError};

/// Schema of one vendor operation.
///
/// The serialized form of `Self` is the request payload: optional fields must
/// be skipped when absent so they never go out as `null`. `Output` lists the
/// reply fields the operation cares about; anything else in the reply is
/// ignored.
pub trait Operation: Serialize {
    /// Message type written into the frame header.
    const OPCODE: u16;
    /// Short name used in errors and logs.
    const NAME: &'static str;
    /// Surface the controller serves this operation on.
    const PORT: ApiPort;
    /// Result fields copied from a successful reply.
    type Output: DeserializeOwned;

    /// Local checks run before any I/O.
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        Ok(())
    }

    /// JSON payload, or `None` when the operation sends no body.
    fn payload(&self) -> std::result::Result<Option<Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Null => Ok(None),
            Value::Object(map) if map.is_empty() => Ok(None),
            value => Ok(Some(value)),
        }
    }

    /// Extract the result fields from a successful reply.
    fn decode(envelope: &Envelope) -> std::result::Result<Self::Output, serde_json::Error> {
        envelope.decode()
    }
}

/// Result of an operation whose only outcome is success or failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Ack {}

/// The controller answered with a non-zero `ret_code`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("controller returned code {ret_code}: {}", .err_msg.as_deref().unwrap_or("no error message"))]
pub struct ApplicationError {
    pub ret_code: i64,
    pub err_msg: Option<String>,
}

impl ApplicationError {
    pub fn from_envelope(envelope: &Envelope) -> Self {
        Self {
            ret_code: envelope.ret_code(),
            err_msg: envelope.err_msg().map(str::to_owned),
        }
    }
}

/// Application-level answer to a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<R> {
    Success(R),
    Failure(ApplicationError),
}

impl<R> Outcome<R> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn success(&self) -> Option<&R> {
        match self {
            Outcome::Success(result) => Some(result),
            Outcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ApplicationError> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(err) => Some(err),
        }
    }

    /// Convert into a `Result`, treating the application failure as the error.
    pub fn into_result(self) -> std::result::Result<R, ApplicationError> {
        match self {
            Outcome::Success(result) => Ok(result),
            Outcome::Failure(err) => Err(err),
        }
    }
}

/// Lifecycle of one [`Command`] execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Created,
    Validated,
    Sent,
    Succeeded,
    Failed,
}

impl CommandState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CommandState::Succeeded | CommandState::Failed)
    }
}

/// One operation plus its request bookkeeping and last outcome.
///
/// Each `execute` starts over from validation, so the operation's fields may
/// be changed between sends.
pub struct Command<O: Operation> {
    operation: O,
    request_id: u16,
    state: CommandState,
    outcome: Option<Outcome<O::Output>>,
}

impl<O: Operation> Command<O> {
    pub fn new(operation: O) -> Self {
        Self {
            operation,
            request_id: 0,
            state: CommandState::Created,
            outcome: None,
        }
    }

    pub fn with_request_id(mut self, request_id: u16) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn operation(&self) -> &O {
        &self.operation
    }

    /// Mutable access to the fields. Resets the command to `Created`.
    pub fn operation_mut(&mut self) -> &mut O {
        self.state = CommandState::Created;
        self.outcome = None;
        &mut self.operation
    }

    pub fn request_id(&self) -> u16 {
        self.request_id
    }

    pub fn state(&self) -> CommandState {
        self.state
    }

    /// Run the local checks, moving to `Validated` on success.
    pub fn validate(&mut self) -> Result<()> {
        match self.operation.validate() {
            Ok(()) => {
                self.state = CommandState::Validated;
                Ok(())
            }
            Err(source) => {
                self.state = CommandState::Failed;
                Err(ClientError::Validation {
                    command: O::NAME,
                    source,
                })
            }
        }
    }

    /// Validate, exchange and record the outcome.
    ///
    /// A non-zero `ret_code` is returned as `Ok(Outcome::Failure)`. Errors
    /// leave the command `Failed` with no outcome.
    pub fn execute<E: Exchange + ?Sized>(&mut self, channel: &E) -> Result<&Outcome<O::Output>> {
        self.outcome = None;
        self.state = CommandState::Created;
        self.validate()?;

        let outcome = match self.send(channel) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.state = CommandState::Failed;
                return Err(err);
            }
        };

        self.state = if outcome.is_success() {
            CommandState::Succeeded
        } else {
            CommandState::Failed
        };
        debug!(
            command = O::NAME,
            opcode = O::OPCODE,
            state = ?self.state,
            "command executed"
        );
        Ok(self.outcome.insert(outcome))
    }

    fn send<E: Exchange + ?Sized>(&mut self, channel: &E) -> Result<Outcome<O::Output>> {
        let payload = self.operation.payload()?;
        self.state = CommandState::Sent;
        let envelope = channel.exchange(self.request_id, O::OPCODE, payload.as_ref())?;

        if !envelope.is_success() {
            return Ok(Outcome::Failure(ApplicationError::from_envelope(&envelope)));
        }
        let result = O::decode(&envelope).map_err(|source| ProtocolError::Result {
            opcode: O::OPCODE,
            source,
        })?;
        Ok(Outcome::Success(result))
    }

    /// True after a successful exchange.
    pub fn succeeded(&self) -> bool {
        self.state == CommandState::Succeeded
    }

    /// The controller's failure message from the last exchange.
    pub fn error_message(&self) -> Option<&str> {
        self.outcome
            .as_ref()
            .and_then(Outcome::failure)
            .and_then(|err| err.err_msg.as_deref())
    }

    /// Result fields from the last successful exchange.
    pub fn result(&self) -> Option<&O::Output> {
        self.outcome.as_ref().and_then(Outcome::success)
    }

    pub fn outcome(&self) -> Option<&Outcome<O::Output>> {
        self.outcome.as_ref()
    }

    pub fn into_outcome(self) -> Option<Outcome<O::Output>> {
        self.outcome
    }

    /// Execute `operation` once and return its outcome.
    pub fn run<E: Exchange + ?Sized>(operation: O, channel: &E) -> Result<Outcome<O::Output>> {
        let mut command = Self::new(operation);
        command.validate()?;
        command.send(channel)
    }
}

/// Object-safe view of a [`Command`], for running mixed batches.
pub trait Execute {
    fn name(&self) -> &'static str;
    fn opcode(&self) -> u16;
    fn state(&self) -> CommandState;

    /// Execute once. `Ok(true)` on success, `Ok(false)` on an application failure.
    fn execute_dyn(&mut self, channel: &dyn Exchange) -> Result<bool>;

    fn error_message(&self) -> Option<&str>;
}

impl<O: Operation> Execute for Command<O> {
    fn name(&self) -> &'static str {
        O::NAME
    }

    fn opcode(&self) -> u16 {
        O::OPCODE
    }

    fn state(&self) -> CommandState {
        self.state
    }

    fn execute_dyn(&mut self, channel: &dyn Exchange) -> Result<bool> {
        self.execute(channel).map(Outcome::is_success)
    }

    fn error_message(&self) -> Option<&str> {
        Command::error_message(self)
    }
}
