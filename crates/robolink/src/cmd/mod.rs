use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use robolink_client::ops::MoveMethod;
use robolink_client::{CommandChannel, Connection, ConnectionConfig, Operation};
use robolink_transport::{ApiPort, RetryPolicy};

use crate::exit::{application_error, client_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{now_unix_seconds, print_outcome, CommandOutput, OutputFormat};

pub mod goto;
pub mod monitor;
pub mod send;
pub mod status;
pub mod task;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Query every status surface once and print a report.
    Status(StatusArgs),
    /// Send the vehicle to a station.
    Goto(GotoArgs),
    /// Suspend, resume or cancel the current navigation task.
    Task(TaskArgs),
    /// Send one raw request and print the reply.
    Send(SendArgs),
    /// Stream push telemetry.
    Monitor(MonitorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, connect: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Status(args) => status::run(args, connect, format),
        Command::Goto(args) => goto::run(args, connect, format),
        Command::Task(args) => task::run(args, connect, format),
        Command::Send(args) => send::run(args, connect, format),
        Command::Monitor(args) => monitor::run(args, connect, format),
        Command::Version(args) => version::run(args),
    }
}

/// Connection settings shared by every networked subcommand.
#[derive(Args, Debug, Clone)]
pub struct ConnectOptions {
    /// Connect attempts before giving up.
    #[arg(long, default_value_t = 3, global = true)]
    pub retries: u32,
    /// Pause between connect attempts (e.g. 5s, 500ms).
    #[arg(long, default_value = "1s", global = true)]
    pub retry_delay: String,
    /// Connect and reply timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", global = true)]
    pub timeout: String,
}

impl ConnectOptions {
    pub fn config(&self, host: &str, api: ApiPort) -> CliResult<ConnectionConfig> {
        self.config_for_port(host, api.port())
    }

    pub fn config_for_port(&self, host: &str, port: u16) -> CliResult<ConnectionConfig> {
        if host.trim().is_empty() {
            return Err(CliError::new(USAGE, "host must not be empty"));
        }
        let delay = parse_duration(&self.retry_delay)?;
        let timeout = parse_duration(&self.timeout)?;
        Ok(
            ConnectionConfig::new(robolink_transport::Endpoint::new(host.trim(), port))
                .with_retry(RetryPolicy::fixed(self.retries, delay))
                .with_connect_timeout(Some(timeout))
                .with_read_timeout(Some(timeout)),
        )
    }

    /// Channel that connects on its first request.
    pub fn channel(&self, host: &str, api: ApiPort) -> CliResult<CommandChannel> {
        Ok(CommandChannel::new(Connection::new(self.config(host, api)?)))
    }
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Vehicle address.
    #[arg(env = "ROBOLINK_HOST")]
    pub host: String,
}

#[derive(Args, Debug)]
pub struct GotoArgs {
    /// Vehicle address.
    #[arg(env = "ROBOLINK_HOST")]
    pub host: String,
    /// Target station id (e.g. LM15).
    pub station: String,
    /// Station the vehicle starts from.
    #[arg(long)]
    pub source: Option<String>,
    /// Caller-chosen task id.
    #[arg(long)]
    pub task_id: Option<String>,
    /// Speed limit in m/s.
    #[arg(long)]
    pub max_speed: Option<f64>,
    /// Drive forward or backward.
    #[arg(long)]
    pub method: Option<MoveMethod>,
    /// Heading at the target, in radians.
    #[arg(long, allow_negative_numbers = true)]
    pub angle: Option<f64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum TaskAction {
    Suspend,
    Resume,
    Cancel,
}

#[derive(Args, Debug)]
pub struct TaskArgs {
    /// Vehicle address.
    #[arg(env = "ROBOLINK_HOST")]
    pub host: String,
    /// What to do with the current task.
    pub action: TaskAction,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Vehicle address.
    #[arg(env = "ROBOLINK_HOST")]
    pub host: String,
    /// API surface by name (state, task, other, ...) or port number.
    /// Defaults to the surface that serves the opcode.
    #[arg(long)]
    pub port: Option<String>,
    /// Message type of the request.
    #[arg(long)]
    pub opcode: u16,
    /// JSON payload.
    #[arg(long)]
    pub json: Option<String>,
    /// Request id written to the header.
    #[arg(long, default_value_t = 0)]
    pub request_id: u16,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Vehicle address.
    #[arg(env = "ROBOLINK_HOST")]
    pub host: String,
    /// Push interval (e.g. 1s, 200ms).
    #[arg(long, default_value = "1s")]
    pub interval: String,
    /// Telemetry fields to request (comma-separated). Default: all common fields.
    #[arg(long, value_delimiter = ',')]
    pub fields: Option<Vec<String>>,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Run a typed operation, print its outcome, and turn a rejection into exit code 2.
pub fn run_operation<O: Operation>(
    channel: &CommandChannel,
    operation: O,
    format: OutputFormat,
) -> CliResult<i32> {
    let outcome = channel
        .call(operation)
        .map_err(|err| client_error(&format!("{} failed", O::NAME), err))?;

    let failure = outcome.failure();
    print_outcome(
        &CommandOutput {
            command: O::NAME,
            endpoint: channel.endpoint().to_string(),
            opcode: O::OPCODE,
            success: failure.is_none(),
            ret_code: failure.map_or(0, |err| err.ret_code),
            err_msg: failure.and_then(|err| err.err_msg.as_deref()),
            timestamp: now_unix_seconds(),
        },
        format,
    );

    match outcome.into_result() {
        Ok(_) => Ok(SUCCESS),
        Err(err) => Err(application_error(&format!("{} rejected", O::NAME), &err)),
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}
