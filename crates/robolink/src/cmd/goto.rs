use robolink_client::ops::GotoStation;
use robolink_transport::ApiPort;

use crate::cmd::{run_operation, ConnectOptions, GotoArgs};
use crate::exit::CliResult;
use crate::output::OutputFormat;

pub fn run(args: GotoArgs, connect: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    let channel = connect.channel(&args.host, ApiPort::Task)?;
    run_operation(&channel, build(args), format)
}

fn build(args: GotoArgs) -> GotoStation {
    let mut op = GotoStation::new(args.station);
    if let Some(source) = args.source {
        op = op.with_source(source);
    }
    if let Some(task_id) = args.task_id {
        op = op.with_task_id(task_id);
    }
    if let Some(max_speed) = args.max_speed {
        op = op.with_max_speed(max_speed);
    }
    if let Some(method) = args.method {
        op = op.with_method(method);
    }
    if let Some(angle) = args.angle {
        op = op.with_angle(angle);
    }
    op
}
