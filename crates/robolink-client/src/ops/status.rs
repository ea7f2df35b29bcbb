//! Status queries, served on the STATE port.
//!
//! Result types decode leniently: a field the controller leaves out keeps its
//! default, and fields not listed here are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::nullable;
use crate::codes::{BlockReason, TaskStatus, TaskType};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub confidence: f64,
    #[serde(deserialize_with = "nullable")]
    pub current_station: String,
    #[serde(deserialize_with = "nullable")]
    pub last_station: String,
    pub create_on: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Speed {
    pub vx: f64,
    pub vy: f64,
    pub w: f64,
    pub steer: f64,
    pub spin: f64,
    /// Measured values; the fields above are commanded.
    pub r_vx: f64,
    pub r_vy: f64,
    pub r_w: f64,
    pub r_steer: f64,
    pub r_spin: f64,
    #[serde(deserialize_with = "nullable")]
    pub steer_angles: Vec<f64>,
    pub is_stop: bool,
    pub create_on: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Blocked {
    pub blocked: bool,
    pub block_reason: Option<BlockReason>,
    pub block_x: f64,
    pub block_y: f64,
    pub block_id: i64,
    pub slow_down: bool,
    pub slow_reason: Option<BlockReason>,
    pub slow_x: f64,
    pub slow_y: f64,
    pub slow_id: i64,
    pub create_on: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Battery {
    /// 0.0 to 1.0
    pub battery_level: f64,
    pub battery_temp: f64,
    pub charging: bool,
    pub voltage: f64,
    pub current: f64,
    pub max_charge_voltage: f64,
    pub max_charge_current: f64,
    pub manual_charge: bool,
    pub auto_charge: bool,
    pub battery_cycle: i64,
    pub create_on: Option<String>,
}

impl Battery {
    /// Instantaneous power in watts.
    pub fn power(&self) -> f64 {
        self.voltage * self.current
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Lasers {
    #[serde(deserialize_with = "nullable")]
    pub lasers: Vec<Value>,
    pub create_on: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Emergency {
    pub emergency: bool,
    pub driver_emc: bool,
    pub electric: bool,
    pub soft_emc: bool,
    pub create_on: Option<String>,
}

impl Emergency {
    /// True when any stop source is active.
    pub fn any(&self) -> bool {
        self.emergency || self.driver_emc || self.soft_emc
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Navigation {
    pub task_status: Option<TaskStatus>,
    pub task_type: Option<TaskType>,
    #[serde(deserialize_with = "nullable")]
    pub target_id: String,
    #[serde(deserialize_with = "nullable")]
    pub target_point: Vec<f64>,
    #[serde(deserialize_with = "nullable")]
    pub finished_path: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub unfinished_path: Vec<String>,
    pub create_on: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Forklift {
    pub fork_height: f64,
    pub fork_height_in_place: bool,
    pub fork_auto_flag: bool,
    pub forward_val: f64,
    pub forward_in_place: bool,
    pub fork_pressure_actual: f64,
    pub create_on: Option<String>,
}

bodiless_operation! {
    /// Position in the map frame (1004).
    QueryPose => 1004, State, "pose", Pose
}

bodiless_operation! {
    /// Commanded and measured velocity (1005).
    QuerySpeed => 1005, State, "speed", Speed
}

bodiless_operation! {
    /// Obstacle blocking and slowdown state (1006).
    QueryBlocked => 1006, State, "blocked", Blocked
}

bodiless_operation! {
    QueryBattery => 1007, State, "battery", Battery
}

bodiless_operation! {
    /// Latest laser scan points (1009).
    QueryLasers => 1009, State, "lasers", Lasers
}

bodiless_operation! {
    QueryEmergency => 1012, State, "emergency", Emergency
}

bodiless_operation! {
    /// Current navigation task and path (1020).
    QueryNavigation => 1020, State, "navigation", Navigation
}

bodiless_operation! {
    QueryForklift => 1028, State, "forklift", Forklift
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::Envelope;

    fn decode<T: serde::de::DeserializeOwned>(reply: Value) -> T {
        Envelope::from_value(reply).unwrap().decode().unwrap()
    }

    #[test]
    fn battery_power_is_voltage_times_current() {
        let battery: Battery = decode(json!({
            "ret_code": 0,
            "battery_level": 0.82,
            "voltage": 48.0,
            "current": -2.5,
            "charging": false,
            "create_on": "2023-03-23T10:00:00.000Z"
        }));
        assert_eq!(battery.battery_level, 0.82);
        assert_eq!(battery.power(), -120.0);
        assert_eq!(battery.battery_cycle, 0);
        assert_eq!(battery.create_on.as_deref(), Some("2023-03-23T10:00:00.000Z"));
    }

    #[test]
    fn navigation_translates_codes() {
        let nav: Navigation = decode(json!({
            "ret_code": 0,
            "task_status": 2,
            "task_type": 3,
            "target_id": "LM15",
            "target_point": [1.0, 2.0, 0.0],
            "finished_path": ["LM1"],
            "unfinished_path": null
        }));
        assert_eq!(nav.task_status, Some(TaskStatus::Running));
        assert_eq!(nav.task_type.map(TaskType::label), Some("Path Navigation to Station"));
        assert_eq!(nav.finished_path, vec!["LM1".to_string()]);
        assert!(nav.unfinished_path.is_empty());
    }

    #[test]
    fn unknown_task_status_is_unknown() {
        let nav: Navigation = decode(json!({"ret_code": 0, "task_status": 99}));
        assert_eq!(nav.task_status.map(TaskStatus::label), Some("Unknown"));
    }

    #[test]
    fn blocked_reasons_decode() {
        let blocked: Blocked = decode(json!({
            "ret_code": 0,
            "blocked": true,
            "block_reason": 1,
            "slow_down": true,
            "slow_reason": 42
        }));
        assert!(blocked.blocked);
        assert_eq!(blocked.block_reason, Some(BlockReason::Laser));
        assert_eq!(blocked.slow_reason.map(BlockReason::label), Some("Unknown"));
    }

    #[test]
    fn pose_ignores_extra_fields() {
        let pose: Pose = decode(json!({
            "ret_code": 0,
            "x": 1.5,
            "y": -0.25,
            "angle": 3.14,
            "current_station": null,
            "vendor_specific": {"nested": true}
        }));
        assert_eq!(pose.x, 1.5);
        assert_eq!(pose.current_station, "");
    }

    #[test]
    fn emergency_any() {
        let emc: Emergency = decode(json!({"ret_code": 0, "soft_emc": true}));
        assert!(emc.any());
        assert!(!Emergency::default().any());
    }
}
