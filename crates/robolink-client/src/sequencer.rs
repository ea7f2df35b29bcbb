use serde::Serialize;
use tracing::{debug, warn};

use crate::channel::Exchange;
use crate::command::{Command, Execute, Operation};
use crate::error::Result;
use crate::ops::{
    Battery, Blocked, Emergency, Forklift, Lasers, Navigation, Pose, QueryBattery, QueryBlocked,
    QueryEmergency, QueryForklift, QueryLasers, QueryNavigation, QueryPose, QuerySpeed, Speed,
};

/// A command in a batch that the controller rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub index: usize,
    pub command: &'static str,
    pub opcode: u16,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub executed: usize,
    pub succeeded: usize,
    pub failures: Vec<BatchFailure>,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One reading of every status query.
///
/// A query the controller rejected is `None` and listed in `failures`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusReport {
    pub battery: Option<Battery>,
    pub pose: Option<Pose>,
    pub speed: Option<Speed>,
    pub forklift: Option<Forklift>,
    pub emergency: Option<Emergency>,
    pub lasers: Option<Lasers>,
    pub blocked: Option<Blocked>,
    pub navigation: Option<Navigation>,
    pub failures: Vec<BatchFailure>,
}

/// Runs commands one after another over a single channel.
///
/// Rejections by the controller are collected and the batch continues; a
/// connection, protocol or validation error stops it.
pub struct StatusSequencer<'a, E: Exchange> {
    channel: &'a E,
}

impl<'a, E: Exchange> StatusSequencer<'a, E> {
    pub fn new(channel: &'a E) -> Self {
        Self { channel }
    }

    pub fn run(&self, commands: &mut [&mut dyn Execute]) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();
        for (index, command) in commands.iter_mut().enumerate() {
            let succeeded = command.execute_dyn(self.channel)?;
            summary.executed += 1;
            if succeeded {
                summary.succeeded += 1;
            } else {
                warn!(
                    command = command.name(),
                    opcode = command.opcode(),
                    error = command.error_message().unwrap_or_default(),
                    "command rejected"
                );
                summary.failures.push(BatchFailure {
                    index,
                    command: command.name(),
                    opcode: command.opcode(),
                    message: command.error_message().map(str::to_owned),
                });
            }
        }
        debug!(
            executed = summary.executed,
            succeeded = summary.succeeded,
            "batch finished"
        );
        Ok(summary)
    }

    /// Query battery, pose, speed, forklift, emergency, lasers, blocked and
    /// navigation state, in that order.
    pub fn snapshot(&self) -> Result<StatusReport> {
        let mut battery = Command::new(QueryBattery);
        let mut pose = Command::new(QueryPose);
        let mut speed = Command::new(QuerySpeed);
        let mut forklift = Command::new(QueryForklift);
        let mut emergency = Command::new(QueryEmergency);
        let mut lasers = Command::new(QueryLasers);
        let mut blocked = Command::new(QueryBlocked);
        let mut navigation = Command::new(QueryNavigation);

        let mut batch: [&mut dyn Execute; 8] = [
            &mut battery,
            &mut pose,
            &mut speed,
            &mut forklift,
            &mut emergency,
            &mut lasers,
            &mut blocked,
            &mut navigation,
        ];
        let summary = self.run(&mut batch)?;

        Ok(StatusReport {
            battery: into_result(battery),
            pose: into_result(pose),
            speed: into_result(speed),
            forklift: into_result(forklift),
            emergency: into_result(emergency),
            lasers: into_result(lasers),
            blocked: into_result(blocked),
            navigation: into_result(navigation),
            failures: summary.failures,
        })
    }
}

fn into_result<O: Operation>(command: Command<O>) -> Option<O::Output> {
    command.into_outcome().and_then(|outcome| outcome.into_result().ok())
}
