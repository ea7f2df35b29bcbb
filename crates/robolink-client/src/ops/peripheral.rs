//! Audio, digital I/O, soft e-stop and fork actuation on the OTHER port.

use robolink_transport::ApiPort;
use serde::{Deserialize, Serialize};

use super::{nullable, require_finite};
use crate::command::{Ack, Operation};
use crate::error::ValidationError;

/// Play a named audio file (6000).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayAudio {
    pub name: String,
    #[serde(rename = "loop")]
    pub repeat: bool,
}

impl PlayAudio {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repeat: false,
        }
    }

    pub fn looped(mut self) -> Self {
        self.repeat = true;
        self
    }
}

impl Operation for PlayAudio {
    const OPCODE: u16 = 6000;
    const NAME: &'static str = "play-audio";
    const PORT: ApiPort = ApiPort::Other;
    type Output = Ack;

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        Ok(())
    }
}

/// Drive one digital output (6001).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SetDigitalOutput {
    pub id: u32,
    pub status: bool,
}

impl SetDigitalOutput {
    pub fn new(id: u32, status: bool) -> Self {
        Self { id, status }
    }
}

impl Operation for SetDigitalOutput {
    const OPCODE: u16 = 6001;
    const NAME: &'static str = "set-do";
    const PORT: ApiPort = ApiPort::Other;
    type Output = Ack;
}

/// Drive several digital outputs at once (6002). Sent as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetDigitalOutputs(pub Vec<SetDigitalOutput>);

impl Operation for SetDigitalOutputs {
    const OPCODE: u16 = 6002;
    const NAME: &'static str = "set-do-batch";
    const PORT: ApiPort = ApiPort::Other;
    type Output = Ack;

    fn validate(&self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            return Err(ValidationError::Empty("outputs"));
        }
        Ok(())
    }
}

/// Engage or release the software emergency stop (6004).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SetSoftEmergency {
    pub status: bool,
}

impl Operation for SetSoftEmergency {
    const OPCODE: u16 = 6004;
    const NAME: &'static str = "soft-emc";
    const PORT: ApiPort = ApiPort::Other;
    type Output = Ack;
}

/// Override a digital input virtually (6020).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SetDigitalInput {
    pub id: u32,
    pub status: bool,
}

impl SetDigitalInput {
    pub fn new(id: u32, status: bool) -> Self {
        Self { id, status }
    }
}

impl Operation for SetDigitalInput {
    const OPCODE: u16 = 6020;
    const NAME: &'static str = "set-di";
    const PORT: ApiPort = ApiPort::Other;
    type Output = Ack;
}

/// Reply of [`ListAudio`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioList {
    #[serde(deserialize_with = "nullable")]
    pub audios: Vec<String>,
}

/// Lift or lower the fork to `height` metres (6040).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SetForkHeight {
    pub height: f64,
}

impl Operation for SetForkHeight {
    const OPCODE: u16 = 6040;
    const NAME: &'static str = "fork-height";
    const PORT: ApiPort = ApiPort::Other;
    type Output = Ack;

    fn validate(&self) -> Result<(), ValidationError> {
        require_finite("height", self.height)?;
        if self.height < 0.0 {
            return Err(ValidationError::Invalid {
                field: "height",
                reason: format!("{} is below zero", self.height),
            });
        }
        Ok(())
    }
}

bodiless_operation! {
    PauseAudio => 6010, Other, "pause-audio", Ack
}

bodiless_operation! {
    ResumeAudio => 6011, Other, "resume-audio", Ack
}

bodiless_operation! {
    StopAudio => 6012, Other, "stop-audio", Ack
}

bodiless_operation! {
    /// Names of the audio files stored on the vehicle (6033).
    ListAudio => 6033, Other, "list-audio", AudioList
}

bodiless_operation! {
    /// Halt fork motion (6041).
    StopFork => 6041, Other, "stop-fork", Ack
}
