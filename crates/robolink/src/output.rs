use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use robolink_client::{PushMessage, StatusReport};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Outcome of one typed command.
#[derive(Serialize)]
pub struct CommandOutput<'a> {
    pub command: &'a str,
    pub endpoint: String,
    pub opcode: u16,
    pub success: bool,
    pub ret_code: i64,
    pub err_msg: Option<&'a str>,
    pub timestamp: String,
}

pub fn print_outcome(out: &CommandOutput<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => println!("{}", to_json(out)),
        OutputFormat::Pretty => {
            println!(
                "{} opcode={} endpoint={} {}",
                out.command,
                out.opcode,
                out.endpoint,
                if out.success { "ok" } else { "rejected" }
            );
            if let Some(message) = out.err_msg {
                println!("  {message}");
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "OPCODE", "ENDPOINT", "RET_CODE", "MESSAGE"])
                .add_row(vec![
                    out.command.to_string(),
                    out.opcode.to_string(),
                    out.endpoint.clone(),
                    out.ret_code.to_string(),
                    out.err_msg.unwrap_or("-").to_string(),
                ]);
            println!("{table}");
        }
    }
}

/// Reply to a raw `send`.
#[derive(Serialize)]
pub struct ReplyOutput<'a> {
    pub command: &'a str,
    pub endpoint: String,
    pub opcode: u16,
    pub reply_type: u16,
    pub ret_code: Option<i64>,
    pub fields: &'a Map<String, Value>,
    pub timestamp: String,
}

pub fn print_reply(reply: &ReplyOutput<'_>, raw: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", to_json(reply)),
        OutputFormat::Table => {
            let mut table = fields_table(reply.fields);
            table.add_row(vec!["(opcode)".to_string(), reply.opcode.to_string()]);
            table.add_row(vec!["(reply)".to_string(), reply.reply_type.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} opcode={} reply={} endpoint={} ret_code={}",
                reply.command,
                reply.opcode,
                reply.reply_type,
                reply.endpoint,
                reply
                    .ret_code
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
            println!("{}", to_json_pretty(reply.fields));
        }
        OutputFormat::Raw => print_raw(raw),
    }
}

pub fn print_report(report: &StatusReport, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => println!("{}", to_json(report)),
        OutputFormat::Pretty => println!("{}", to_json_pretty(report)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["QUERY", "VALUE"]);
            for (query, value) in report_rows(report) {
                table.add_row(vec![query.to_string(), value]);
            }
            for failure in &report.failures {
                table.add_row(vec![
                    failure.command.to_string(),
                    format!(
                        "rejected: {}",
                        failure.message.as_deref().unwrap_or("no error message")
                    ),
                ]);
            }
            println!("{table}");
        }
    }
}

#[derive(Serialize)]
struct PushOutput<'a> {
    message_type: u16,
    fields: &'a Map<String, Value>,
    timestamp: String,
}

pub fn print_push(message: &PushMessage, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PushOutput {
                message_type: message.message_type,
                fields: &message.fields,
                timestamp: now_unix_seconds(),
            };
            println!("{}", to_json(&out));
        }
        OutputFormat::Table => println!("{}", fields_table(&message.fields)),
        OutputFormat::Pretty => {
            let pairs: Vec<String> = message
                .fields
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            println!("type={} {}", message.message_type, pairs.join(" "));
        }
        OutputFormat::Raw => println!("{}", to_json(&message.fields)),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.write_all(b"\n");
    let _ = out.flush();
}

fn report_rows(report: &StatusReport) -> Vec<(&'static str, String)> {
    let mut rows = Vec::new();
    if let Some(battery) = &report.battery {
        rows.push((
            "battery",
            format!(
                "{:.0}% {:.1} V {:.1} A{}",
                battery.battery_level * 100.0,
                battery.voltage,
                battery.current,
                if battery.charging { " charging" } else { "" }
            ),
        ));
    }
    if let Some(pose) = &report.pose {
        rows.push((
            "pose",
            format!(
                "x={:.3} y={:.3} angle={:.3} station={}",
                pose.x,
                pose.y,
                pose.angle,
                or_dash(&pose.current_station)
            ),
        ));
    }
    if let Some(speed) = &report.speed {
        rows.push((
            "speed",
            format!(
                "vx={:.3} vy={:.3} w={:.3}{}",
                speed.vx,
                speed.vy,
                speed.w,
                if speed.is_stop { " stopped" } else { "" }
            ),
        ));
    }
    if let Some(fork) = &report.forklift {
        rows.push((
            "forklift",
            format!(
                "height={:.3}{}",
                fork.fork_height,
                if fork.fork_height_in_place { " in place" } else { "" }
            ),
        ));
    }
    if let Some(emergency) = &report.emergency {
        rows.push((
            "emergency",
            if emergency.any() {
                format!(
                    "ACTIVE (button={} driver={} soft={})",
                    emergency.emergency, emergency.driver_emc, emergency.soft_emc
                )
            } else {
                "clear".to_string()
            },
        ));
    }
    if let Some(lasers) = &report.lasers {
        rows.push(("lasers", format!("{} scanners", lasers.lasers.len())));
    }
    if let Some(blocked) = &report.blocked {
        let value = match (blocked.blocked, blocked.block_reason) {
            (true, Some(reason)) => format!("blocked: {reason}"),
            (true, None) => "blocked".to_string(),
            (false, _) if blocked.slow_down => match blocked.slow_reason {
                Some(reason) => format!("slowing: {reason}"),
                None => "slowing".to_string(),
            },
            (false, _) => "clear".to_string(),
        };
        rows.push(("blocked", value));
    }
    if let Some(nav) = &report.navigation {
        rows.push((
            "navigation",
            format!(
                "{} {} target={}",
                nav.task_status
                    .map(|status| status.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                nav.task_type
                    .map(|kind| kind.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                or_dash(&nav.target_id)
            ),
        ));
    }
    rows
}

fn fields_table(fields: &Map<String, Value>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["FIELD", "VALUE"]);
    for (key, value) in fields {
        let value = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        table.add_row(vec![key.clone(), value]);
    }
    table
}

fn or_dash(text: &str) -> &str {
    if text.is_empty() {
        "-"
    } else {
        text
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

pub fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
