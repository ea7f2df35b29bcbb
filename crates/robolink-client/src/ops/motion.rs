use robolink_transport::ApiPort;
use serde::Serialize;

use super::require_finite;
use crate::command::{Ack, Operation};
use crate::error::ValidationError;

/// Open-loop velocity command on the CTRL port (2010).
///
/// The controller holds the velocity until `duration` ms elapse or the next
/// motion command arrives.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OpenLoopMotion {
    /// m/s
    pub vx: f64,
    /// m/s
    pub vy: f64,
    /// rad/s
    pub w: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steer: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_steer: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

impl OpenLoopMotion {
    pub fn new(vx: f64, vy: f64, w: f64) -> Self {
        Self {
            vx,
            vy,
            w,
            ..Self::default()
        }
    }

    /// Scale all three velocity components, e.g. to slow down by half.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            vx: self.vx * factor,
            vy: self.vy * factor,
            w: self.w * factor,
            ..self.clone()
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration = Some(duration_ms);
        self
    }
}

impl Operation for OpenLoopMotion {
    const OPCODE: u16 = 2010;
    const NAME: &'static str = "open-loop-motion";
    const PORT: ApiPort = ApiPort::Ctrl;
    type Output = Ack;

    fn validate(&self) -> Result<(), ValidationError> {
        require_finite("vx", self.vx)?;
        require_finite("vy", self.vy)?;
        require_finite("w", self.w)?;
        if let Some(real_steer) = self.real_steer {
            require_finite("real_steer", real_steer)?;
        }
        Ok(())
    }
}
