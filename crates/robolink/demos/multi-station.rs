//! Send a three-leg route, then poll navigation state until the task ends.
//!
//! Run with:
//!   cargo run --example multi-station -- 192.168.0.10

use std::thread;
use std::time::Duration;

use robolink::client::TaskStatus;
use robolink::ops::{GotoStation, GotoStations, MoveMethod, QueryNavigation};
use robolink::{ApiPort, CommandChannel};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let host = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "192.168.0.10".to_string());

    let leg = |dest: &str, source: &str, task_id: &str| {
        GotoStation::new(dest)
            .with_source(source)
            .with_task_id(task_id)
            .with_max_speed(0.8)
            .with_method(MoveMethod::Forward)
            .with_duration(0.0)
    };
    let route = GotoStations::new([
        leg("LM2", "LM1", "action00001"),
        leg("LM3", "LM2", "action00002"),
        leg("LM2", "LM3", "action00003"),
    ]);

    let task = CommandChannel::open(&host, ApiPort::Task)?;
    task.call(route)?.into_result()?;
    eprintln!("route accepted by {}", task.endpoint());

    let state = CommandChannel::open(&host, ApiPort::State)?;
    loop {
        let nav = state.call(QueryNavigation)?.into_result()?;
        let status = nav.task_status.unwrap_or(TaskStatus::None);
        eprintln!("{status}: target={} remaining={:?}", nav.target_id, nav.unfinished_path);
        if status.is_terminal() {
            break;
        }
        thread::sleep(Duration::from_millis(500));
    }

    Ok(())
}
