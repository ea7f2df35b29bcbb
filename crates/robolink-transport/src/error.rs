use crate::ports::Endpoint;

/// Errors that can occur while establishing or using a TCP link to the vehicle.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Every connect attempt allowed by the retry policy failed.
    #[error("failed to connect to {endpoint} after {attempts} attempt(s): {source}")]
    Connect {
        endpoint: Endpoint,
        attempts: u32,
        source: std::io::Error,
    },

    /// The endpoint could not be parsed or resolved.
    #[error("invalid endpoint {0}")]
    InvalidEndpoint(String),

    /// An I/O error occurred on an established stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An operation needed a live socket but none is open.
    #[error("not connected")]
    NotConnected,

    /// The peer closed the stream.
    #[error("connection closed by peer")]
    Closed,
}

impl TransportError {
    /// The underlying I/O error kind, when there is one.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            TransportError::Connect { source, .. } | TransportError::Io(source) => {
                Some(source.kind())
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
