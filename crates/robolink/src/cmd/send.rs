use robolink_client::{CommandChannel, Connection};
use robolink_transport::ApiPort;
use serde_json::Value;

use crate::cmd::{ConnectOptions, SendArgs};
use crate::exit::{client_error, CliError, CliResult, APPLICATION, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{now_unix_seconds, print_reply, OutputFormat, ReplyOutput};

pub fn run(args: SendArgs, connect: &ConnectOptions, format: OutputFormat) -> CliResult<i32> {
    let port = resolve_port(args.port.as_deref(), args.opcode)?;
    let payload = resolve_payload(args.json.as_deref())?;

    let config = connect.config_for_port(&args.host, port)?;
    let channel = CommandChannel::new(Connection::new(config));
    let frame = channel
        .exchange_frame(args.request_id, args.opcode, payload.as_deref())
        .map_err(|err| client_error("send failed", err))?;
    channel.close();

    let fields = match serde_json::from_slice::<Value>(&frame.payload) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => {
            return Err(CliError::new(
                DATA_INVALID,
                "reply payload is not a JSON object",
            ))
        }
        Err(err) => {
            return Err(CliError::new(
                DATA_INVALID,
                format!("reply payload is not valid JSON: {err}"),
            ))
        }
    };
    let ret_code = fields.get("ret_code").and_then(Value::as_i64);

    print_reply(
        &ReplyOutput {
            command: "send",
            endpoint: channel.endpoint().to_string(),
            opcode: args.opcode,
            reply_type: frame.message_type,
            ret_code,
            fields: &fields,
            timestamp: now_unix_seconds(),
        },
        frame.payload.as_ref(),
        format,
    );

    match ret_code {
        Some(code) if code != 0 => Ok(APPLICATION),
        _ => Ok(SUCCESS),
    }
}

/// Accept a surface name, a port number, or nothing (derive from the opcode).
fn resolve_port(port: Option<&str>, opcode: u16) -> CliResult<u16> {
    match port {
        Some(text) => {
            if let Ok(number) = text.trim().parse::<u16>() {
                if number == 0 {
                    return Err(CliError::new(USAGE, "--port must not be 0"));
                }
                return Ok(number);
            }
            text.parse::<ApiPort>()
                .map(ApiPort::port)
                .map_err(|err| CliError::new(USAGE, format!("--port: {err}")))
        }
        None => ApiPort::for_opcode(opcode).map(ApiPort::port).ok_or_else(|| {
            CliError::new(
                USAGE,
                format!("no API surface serves opcode {opcode}; pass --port"),
            )
        }),
    }
}

fn resolve_payload(json: Option<&str>) -> CliResult<Option<Vec<u8>>> {
    let Some(json) = json else {
        return Ok(None);
    };
    serde_json::from_str::<Value>(json)
        .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
    Ok(Some(json.as_bytes().to_vec()))
}
