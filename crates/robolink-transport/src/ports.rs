//! Vehicle API ports.
//!
//! The controller exposes each command surface on its own TCP port. A client
//! opens one connection per surface it uses; they never share a socket.

use std::fmt;
use std::str::FromStr;

use crate::error::TransportError;

/// Robot configuration and identity surface.
pub const PORT_ROBOT: u16 = 19200;
/// Status queries (pose, battery, blockage, ...).
pub const PORT_STATE: u16 = 19204;
/// Direct motion control.
pub const PORT_CTRL: u16 = 19205;
/// Navigation tasks.
pub const PORT_TASK: u16 = 19206;
/// Parameter configuration.
pub const PORT_CONFIG: u16 = 19207;
/// Controller kernel operations.
pub const PORT_KERNEL: u16 = 19208;
/// Peripherals: audio, digital I/O, forks.
pub const PORT_OTHER: u16 = 19210;
/// Push telemetry stream.
pub const PORT_PUSH: u16 = 19301;

/// A logical command surface on the vehicle controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiPort {
    Robot,
    State,
    Ctrl,
    Task,
    Config,
    Kernel,
    Other,
    Push,
}

impl ApiPort {
    /// All known surfaces, in port order.
    pub const ALL: [ApiPort; 8] = [
        ApiPort::Robot,
        ApiPort::State,
        ApiPort::Ctrl,
        ApiPort::Task,
        ApiPort::Config,
        ApiPort::Kernel,
        ApiPort::Other,
        ApiPort::Push,
    ];

    /// TCP port number for this surface.
    pub fn port(self) -> u16 {
        match self {
            ApiPort::Robot => PORT_ROBOT,
            ApiPort::State => PORT_STATE,
            ApiPort::Ctrl => PORT_CTRL,
            ApiPort::Task => PORT_TASK,
            ApiPort::Config => PORT_CONFIG,
            ApiPort::Kernel => PORT_KERNEL,
            ApiPort::Other => PORT_OTHER,
            ApiPort::Push => PORT_PUSH,
        }
    }

    /// Human-readable surface name.
    pub fn name(self) -> &'static str {
        match self {
            ApiPort::Robot => "ROBOT",
            ApiPort::State => "STATE",
            ApiPort::Ctrl => "CTRL",
            ApiPort::Task => "TASK",
            ApiPort::Config => "CONFIG",
            ApiPort::Kernel => "KERNEL",
            ApiPort::Other => "OTHER",
            ApiPort::Push => "PUSH",
        }
    }

    /// Reverse lookup from a port number.
    pub fn from_port(port: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.port() == port)
    }

    /// Surface that serves `opcode`, by the controller's numbering scheme
    /// (1xxx status, 2xxx control, 3xxx navigation, ...).
    pub fn for_opcode(opcode: u16) -> Option<Self> {
        match opcode {
            1000..=1999 => Some(ApiPort::State),
            2000..=2999 => Some(ApiPort::Ctrl),
            3000..=3999 => Some(ApiPort::Task),
            4000..=4999 => Some(ApiPort::Config),
            5000..=5999 => Some(ApiPort::Kernel),
            6000..=6999 => Some(ApiPort::Other),
            9300 => Some(ApiPort::Push),
            _ => None,
        }
    }
}

impl fmt::Display for ApiPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ApiPort {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == upper)
            .ok_or_else(|| TransportError::InvalidEndpoint(format!("unknown api port {s:?}")))
    }
}

/// Host and port of one TCP surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Endpoint for a named surface on `host`.
    pub fn api(host: impl Into<String>, api: ApiPort) -> Self {
        Self::new(host, api.port())
    }

    /// The surface this endpoint points at, if it is a standard port.
    pub fn api_port(&self) -> Option<ApiPort> {
        ApiPort::from_port(self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
