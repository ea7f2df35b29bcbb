//! Catalog of controller operations.
//!
//! Each type is a schema: its serialized fields are the request payload and
//! its `Output` names the reply fields it reads. Run them with
//! [`crate::Command`] or [`crate::CommandChannel::call`].

use serde::{Deserialize, Deserializer};

/// Declare an operation that sends no payload.
macro_rules! bodiless_operation {
    ($(#[$meta:meta])* $name:ident => $opcode:literal, $port:ident, $label:literal, $output:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
        pub struct $name;

        impl crate::command::Operation for $name {
            const OPCODE: u16 = $opcode;
            const NAME: &'static str = $label;
            const PORT: robolink_transport::ApiPort = robolink_transport::ApiPort::$port;
            type Output = $output;
        }
    };
}

pub mod motion;
pub mod navigation;
pub mod peripheral;
pub mod status;

pub use motion::OpenLoopMotion;
pub use navigation::{
    CancelTask, GotoPoint, GotoStation, GotoStations, MoveMethod, ResumeTask, SuspendTask,
};
pub use peripheral::{
    AudioList, ListAudio, PauseAudio, PlayAudio, ResumeAudio, SetDigitalInput,
    SetDigitalOutput, SetDigitalOutputs, SetForkHeight, SetSoftEmergency, StopAudio, StopFork,
};
pub use status::{
    Battery, Blocked, Emergency, Forklift, Lasers, Navigation, Pose, QueryBattery, QueryBlocked,
    QueryEmergency, QueryForklift, QueryLasers, QueryNavigation, QueryPose, QuerySpeed, Speed,
};

/// Treat an explicit `null` like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn require_finite(field: &'static str, value: f64) -> Result<(), crate::ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(crate::ValidationError::Invalid {
            field,
            reason: format!("{value} is not a finite number"),
        })
    }
}

fn require_positive(field: &'static str, value: Option<f64>) -> Result<(), crate::ValidationError> {
    match value {
        Some(v) if !(v.is_finite() && v > 0.0) => Err(crate::ValidationError::Invalid {
            field,
            reason: format!("{v} must be a positive number"),
        }),
        _ => Ok(()),
    }
}
