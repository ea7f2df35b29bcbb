//! Navigation tasks, served on the TASK port.

use std::fmt;
use std::str::FromStr;

use robolink_transport::ApiPort;
use serde::{Deserialize, Serialize};

use super::{require_finite, require_positive};
use crate::command::{Ack, Operation};
use crate::error::ValidationError;

/// How the vehicle approaches its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveMethod {
    Forward,
    Backward,
}

impl fmt::Display for MoveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveMethod::Forward => f.write_str("forward"),
            MoveMethod::Backward => f.write_str("backward"),
        }
    }
}

impl FromStr for MoveMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forward" => Ok(MoveMethod::Forward),
            "backward" => Ok(MoveMethod::Backward),
            other => Err(ValidationError::Invalid {
                field: "method",
                reason: format!("unknown method `{other}`, expected forward or backward"),
            }),
        }
    }
}

/// Drive to one station and stop there (3051).
///
/// Resending the same task with changed limits adjusts the running task,
/// e.g. lowering `max_speed` mid-route.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GotoStation {
    /// Destination station, e.g. `LM15`.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Heading at the target, in the map frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<MoveMethod>,
    /// m/s
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f64>,
    /// rad/s
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_wspeed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_acc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_wacc: Option<f64>,
    /// Milliseconds to hold at the target before the task completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spin: Option<bool>,
}

impl GotoStation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_method(mut self, method: MoveMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = Some(angle);
        self
    }

    pub fn with_max_speed(mut self, max_speed: f64) -> Self {
        self.max_speed = Some(max_speed);
        self
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration = Some(duration_ms);
        self
    }
}

impl Operation for GotoStation {
    const OPCODE: u16 = 3051;
    const NAME: &'static str = "goto-station";
    const PORT: ApiPort = ApiPort::Task;
    type Output = Ack;

    fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingField("id"));
        }
        require_positive("max_speed", self.max_speed)?;
        require_positive("max_wspeed", self.max_wspeed)?;
        require_positive("max_acc", self.max_acc)?;
        require_positive("max_wacc", self.max_wacc)?;
        for (field, value) in [
            ("angle", self.angle),
            ("duration", self.duration),
            ("orientation", self.orientation),
        ] {
            if let Some(value) = value {
                require_finite(field, value)?;
            }
        }
        Ok(())
    }
}

/// Drive through several stations in order (3066).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GotoStations {
    pub move_task_list: Vec<GotoStation>,
}

impl GotoStations {
    pub fn new(legs: impl IntoIterator<Item = GotoStation>) -> Self {
        Self {
            move_task_list: legs.into_iter().collect(),
        }
    }
}

impl Operation for GotoStations {
    const OPCODE: u16 = 3066;
    const NAME: &'static str = "goto-stations";
    const PORT: ApiPort = ApiPort::Task;
    type Output = Ack;

    fn validate(&self) -> Result<(), ValidationError> {
        if self.move_task_list.is_empty() {
            return Err(ValidationError::Empty("move_task_list"));
        }
        self.move_task_list.iter().try_for_each(|leg| leg.validate())
    }
}

/// Free navigation to a map coordinate (3050).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GotoPoint {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_wspeed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_acc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_wacc: Option<f64>,
}

impl GotoPoint {
    pub fn new(x: f64, y: f64, angle: f64) -> Self {
        Self {
            x,
            y,
            angle,
            ..Self::default()
        }
    }

    pub fn with_max_speed(mut self, max_speed: f64) -> Self {
        self.max_speed = Some(max_speed);
        self
    }
}

impl Operation for GotoPoint {
    const OPCODE: u16 = 3050;
    const NAME: &'static str = "goto-point";
    const PORT: ApiPort = ApiPort::Task;
    type Output = Ack;

    fn validate(&self) -> Result<(), ValidationError> {
        require_finite("x", self.x)?;
        require_finite("y", self.y)?;
        require_finite("angle", self.angle)?;
        require_positive("max_speed", self.max_speed)?;
        require_positive("max_wspeed", self.max_wspeed)?;
        require_positive("max_acc", self.max_acc)?;
        require_positive("max_wacc", self.max_wacc)
    }
}

bodiless_operation! {
    /// Pause the current task (3001).
    SuspendTask => 3001, Task, "suspend-task", Ack
}

bodiless_operation! {
    /// Continue a suspended task (3002).
    ResumeTask => 3002, Task, "resume-task", Ack
}

bodiless_operation! {
    /// Abort the current task (3003).
    CancelTask => 3003, Task, "cancel-task", Ack
}
