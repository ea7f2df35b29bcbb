use std::time::Duration;

use robolink_frame::FrameError;
use robolink_transport::TransportError;

/// A command was rejected locally before any bytes were sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required payload field has no value.
    #[error("required field `{0}` is missing")]
    MissingField(&'static str),

    /// A list that must carry entries is empty.
    #[error("`{0}` must not be empty")]
    Empty(&'static str),

    /// A field has a value the controller would reject.
    #[error("field `{field}` is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// The bytes or JSON on the wire did not follow the protocol.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Malformed frame header or oversized payload.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Payload was not valid JSON, or a request could not be serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reply payload decoded, but was not a JSON object.
    #[error("reply payload is not a JSON object")]
    NotAnObject,

    /// Reply object lacks the mandatory integer `ret_code`.
    #[error("reply is missing integer `ret_code`")]
    MissingRetCode,

    /// Successful reply whose result fields do not match the declared types.
    #[error("cannot decode result of opcode {opcode}: {source}")]
    Result {
        opcode: u16,
        source: serde_json::Error,
    },
}

/// Errors surfaced by the client layer.
///
/// Application-level failures (`ret_code != 0`) are not errors; they come
/// back as [`crate::Outcome::Failure`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Local validation failed; nothing was written to the socket.
    #[error("invalid {command} command: {source}")]
    Validation {
        command: &'static str,
        source: ValidationError,
    },

    /// Socket could not be established or maintained.
    #[error("connection error: {0}")]
    Connection(#[from] TransportError),

    /// Malformed frame or reply.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// No reply arrived within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl ClientError {
    /// True for socket-level faults that a reconnect may cure.
    pub fn is_connection_fault(&self) -> bool {
        matches!(self, ClientError::Connection(_))
    }

    /// True when the failure happened before any I/O.
    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation { .. })
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Protocol(ProtocolError::Json(err))
    }
}

/// Sort a frame-layer failure into the client taxonomy.
///
/// `read_timeout` is what the stream was configured with; a timed-out read
/// is reported against it.
pub(crate) fn classify_frame_error(err: FrameError, read_timeout: Option<Duration>) -> ClientError {
    match err {
        FrameError::Io(io)
            if matches!(
                io.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ) =>
        {
            ClientError::Timeout(read_timeout.unwrap_or_default())
        }
        FrameError::Io(io) => ClientError::Connection(TransportError::Io(io)),
        FrameError::ConnectionClosed { .. } => ClientError::Connection(TransportError::Closed),
        other => ClientError::Protocol(ProtocolError::Frame(other)),
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use super::*;

    #[test]
    fn timeouts_are_classified_as_timeout() {
        let err = classify_frame_error(
            FrameError::Io(std::io::Error::from(ErrorKind::WouldBlock)),
            Some(Duration::from_millis(250)),
        );
        assert!(matches!(err, ClientError::Timeout(d) if d == Duration::from_millis(250)));
    }

    #[test]
    fn socket_faults_are_connection_errors() {
        let reset = classify_frame_error(
            FrameError::Io(std::io::Error::from(ErrorKind::ConnectionReset)),
            None,
        );
        assert!(reset.is_connection_fault());

        let closed = classify_frame_error(
            FrameError::ConnectionClosed {
                expected: 16,
                received: 3,
            },
            None,
        );
        assert!(matches!(closed, ClientError::Connection(TransportError::Closed)));
    }

    #[test]
    fn malformed_headers_are_protocol_errors() {
        let err = classify_frame_error(FrameError::InvalidSync { found: 0 }, None);
        assert!(matches!(
            err,
            ClientError::Protocol(ProtocolError::Frame(FrameError::InvalidSync { .. }))
        ));
    }

    #[test]
    fn validation_message_names_command_and_field() {
        let err = ClientError::Validation {
            command: "goto-station",
            source: ValidationError::MissingField("id"),
        };
        assert_eq!(
            err.to_string(),
            "invalid goto-station command: required field `id` is missing"
        );
        assert!(err.is_validation());
    }
}
