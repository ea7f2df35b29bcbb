use robolink_client::StatusSequencer;
use robolink_transport::ApiPort;
use tracing::warn;

use crate::cmd::{ConnectOptions, StatusArgs};
use crate::exit::{client_error, CliResult, APPLICATION, SUCCESS};
use crate::output::{print_report, OutputFormat};

pub fn run(args: StatusArgs, connect: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    let channel = connect.channel(&args.host, ApiPort::State)?;
    let report = StatusSequencer::new(&channel)
        .snapshot()
        .map_err(|err| client_error("status query failed", err))?;
    channel.close();

    print_report(&report, format);

    if report.failures.is_empty() {
        Ok(SUCCESS)
    } else {
        warn!(rejected = report.failures.len(), "some status queries were rejected");
        Ok(APPLICATION)
    }
}
