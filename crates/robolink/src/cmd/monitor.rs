use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use robolink_client::{ConfigurePush, PushListener, DEFAULT_PUSH_FIELDS};
use robolink_transport::ApiPort;
use tracing::info;

use crate::cmd::{parse_duration, ConnectOptions, MonitorArgs};
use crate::exit::{application_error, client_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_push, OutputFormat};

/// Exit status after a second Ctrl-C while blocked on a read.
const INTERRUPTED: i32 = 130;

pub fn run(args: MonitorArgs, connect: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    let request = push_request(&args)?;

    // Pushes arrive on their own schedule; a read timeout would drop the stream.
    let config = connect
        .config(&args.host, ApiPort::Push)?
        .with_read_timeout(None);
    let mut listener =
        PushListener::connect(config).map_err(|err| client_error("connect failed", err))?;

    let outcome = listener
        .configure(&request)
        .map_err(|err| client_error("push configuration failed", err))?;
    if let Some(err) = outcome.failure() {
        return Err(application_error("push configuration rejected", err));
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let message = listener
            .next_message()
            .map_err(|err| client_error("receive failed", err))?;
        if !running.load(Ordering::SeqCst) {
            break;
        }
        print_push(&message, format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }
    }

    listener.close();
    info!(messages = printed, "monitor stopped");
    Ok(SUCCESS)
}

fn push_request(args: &MonitorArgs) -> CliResult<ConfigurePush> {
    let interval = parse_duration(&args.interval)?;
    let interval_ms = u64::try_from(interval.as_millis())
        .map_err(|_| CliError::new(USAGE, "push interval is too long"))?;
    let request = match &args.fields {
        Some(fields) => ConfigurePush::new(
            interval_ms,
            fields
                .iter()
                .map(|field| field.trim())
                .filter(|field| !field.is_empty()),
        ),
        None => ConfigurePush::new(interval_ms, DEFAULT_PUSH_FIELDS.iter().copied()),
    };
    if request.included_fields.is_empty() {
        return Err(CliError::new(USAGE, "--fields must name at least one field"));
    }
    Ok(request)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        if !running.swap(false, Ordering::SeqCst) {
            std::process::exit(INTERRUPTED);
        }
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
