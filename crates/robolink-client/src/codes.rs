//! Integer code tables reported by the controller.
//!
//! Every table is total: a code outside the known set becomes `Unknown(code)`,
//! whose label is [`UNKNOWN_LABEL`]. Codes go over the wire as integers.

use std::fmt;

/// Label for any code a table does not list.
pub const UNKNOWN_LABEL: &str = "Unknown";

macro_rules! code_table {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident = $code:literal => $label:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(from = "i64", into = "i64")]
        pub enum $name {
            $($variant,)+
            /// A code this table does not list.
            Unknown(i64),
        }

        impl $name {
            pub fn from_code(code: i64) -> Self {
                match code {
                    $($code => Self::$variant,)+
                    other => Self::Unknown(other),
                }
            }

            pub fn code(self) -> i64 {
                match self {
                    $(Self::$variant => $code,)+
                    Self::Unknown(code) => code,
                }
            }

            /// Fixed human-readable label.
            pub fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                    Self::Unknown(_) => UNKNOWN_LABEL,
                }
            }

            pub fn is_known(self) -> bool {
                !matches!(self, Self::Unknown(_))
            }
        }

        impl From<i64> for $name {
            fn from(code: i64) -> Self {
                Self::from_code(code)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> i64 {
                value.code()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

code_table! {
    /// State of the current navigation task.
    pub enum TaskStatus {
        None = 0 => "None",
        Waiting = 1 => "Waiting",
        Running = 2 => "Running",
        Suspended = 3 => "Suspended",
        Completed = 4 => "Completed",
        Failed = 5 => "Failed",
        Canceled = 6 => "Canceled",
    }
}

code_table! {
    /// Kind of the current navigation task.
    pub enum TaskType {
        None = 0 => "None",
        FreeToPoint = 1 => "Free Navigation to Point",
        FreeToStation = 2 => "Free Navigation to Station",
        PathToStation = 3 => "Path Navigation to Station",
        Inspection = 4 => "Inspection Navigation",
        TranslationalRotation = 7 => "Translational rotation",
        Other = 100 => "Other",
    }
}

code_table! {
    /// Why the vehicle is blocked or slowing down.
    pub enum BlockReason {
        Ultrasonic = 0 => "Ultrasonic sensor",
        Laser = 1 => "Laser sensor",
        FallingDown = 2 => "Falling Down",
        Collision = 3 => "Collision",
        Infrared = 4 => "Infrared sensor",
        LockSwitch = 5 => "Lock Switch",
        DynamicObstacle = 6 => "Dynamic Obstacle",
        VirtualWall = 7 => "Virtual Wall",
        Camera3d = 8 => "3D Camera",
        DistanceSensor = 9 => "Distance Sensor",
        DiUltrasound = 10 => "DI Ultrasound",
    }
}

impl TaskStatus {
    /// True once the task can no longer progress.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn known_codes_have_labels() {
        assert_eq!(TaskStatus::from_code(2).label(), "Running");
        assert_eq!(TaskType::from_code(7).label(), "Translational rotation");
        assert_eq!(TaskType::from_code(100), TaskType::Other);
        assert_eq!(BlockReason::from_code(8).to_string(), "3D Camera");
    }

    #[test]
    fn unknown_codes_map_to_unknown_label() {
        for code in [99, -1, 7, i64::MAX] {
            let status = TaskStatus::from_code(code);
            assert_eq!(status.label(), UNKNOWN_LABEL);
            assert_eq!(status.code(), code);
            assert!(!status.is_known());
        }
        assert_eq!(TaskType::from_code(5).label(), "Unknown");
        assert_eq!(BlockReason::from_code(11).label(), "Unknown");
    }

    #[test]
    fn serialized_as_wire_code() {
        assert_eq!(serde_json::to_value(TaskStatus::Suspended).unwrap(), json!(3));
        assert_eq!(serde_json::to_value(BlockReason::Unknown(42)).unwrap(), json!(42));

        let reason: BlockReason = serde_json::from_value(json!(6)).unwrap();
        assert_eq!(reason, BlockReason::DynamicObstacle);
        let status: TaskStatus = serde_json::from_value(json!(99)).unwrap();
        assert_eq!(status, TaskStatus::Unknown(99));
    }

    #[test]
    fn terminal_statuses() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Canceled.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(!TaskStatus::Unknown(9).is_terminal());
    }
}
