mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, ConnectOptions};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "robolink", version, about = "AGV controller command-line client")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(flatten)]
    connect: ConnectOptions,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, &cli.connect, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_goto_subcommand() {
        let cli = Cli::try_parse_from([
            "robolink",
            "goto",
            "192.168.0.10",
            "LM15",
            "--max-speed",
            "0.5",
            "--method",
            "backward",
        ])
        .expect("goto args should parse");

        let Command::Goto(args) = cli.command else {
            panic!("expected goto command");
        };
        assert_eq!(args.station, "LM15");
        assert_eq!(args.max_speed, Some(0.5));
    }

    #[test]
    fn connection_flags_are_global() {
        let cli = Cli::try_parse_from([
            "robolink",
            "status",
            "10.0.0.5",
            "--retries",
            "2",
            "--retry-delay",
            "250ms",
            "--timeout",
            "3s",
        ])
        .expect("status args should parse");

        assert_eq!(cli.connect.retries, 2);
        assert_eq!(cli.connect.retry_delay, "250ms");
        assert_eq!(cli.connect.timeout, "3s");
        assert!(matches!(cli.command, Command::Status(_)));
    }

    #[test]
    fn rejects_unknown_task_action() {
        let err = Cli::try_parse_from(["robolink", "task", "10.0.0.5", "pause"])
            .expect_err("unknown action should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn send_requires_opcode() {
        let err = Cli::try_parse_from(["robolink", "send", "10.0.0.5", "--port", "state"])
            .expect_err("missing opcode should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
