use robolink_client::ops::{CancelTask, ResumeTask, SuspendTask};
use robolink_transport::ApiPort;

use crate::cmd::{run_operation, ConnectOptions, TaskAction, TaskArgs};
use crate::exit::CliResult;
use crate::output::OutputFormat;

pub fn run(args: TaskArgs, connect: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    let channel = connect.channel(&args.host, ApiPort::Task)?;
    match args.action {
        TaskAction::Suspend => run_operation(&channel, SuspendTask, format),
        TaskAction::Resume => run_operation(&channel, ResumeTask, format),
        TaskAction::Cancel => run_operation(&channel, CancelTask, format),
    }
}
