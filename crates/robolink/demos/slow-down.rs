//! Halve the current open-loop velocity, ease off by 10% steps, then restore it.
//!
//! Run with:
//!   cargo run --example slow-down -- 192.168.0.10

use std::thread;
use std::time::Duration;

use robolink::ops::{OpenLoopMotion, QuerySpeed};
use robolink::{ApiPort, CommandChannel};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let host = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "192.168.0.10".to_string());

    let state = CommandChannel::open(&host, ApiPort::State)?;
    let ctrl = CommandChannel::open(&host, ApiPort::Ctrl)?;
    let pause = Duration::from_millis(250);

    let speed = state.call(QuerySpeed)?.into_result()?;
    eprintln!("speed now: vx={} vy={} w={}", speed.vx, speed.vy, speed.w);
    let original = OpenLoopMotion::new(speed.vx, speed.vy, speed.w);

    ctrl.call(original.scaled(0.5))?.into_result()?;
    thread::sleep(pause);

    for _ in 0..4 {
        let now = state.call(QuerySpeed)?.into_result()?;
        eprintln!("speed now: vx={} vy={} w={}", now.vx, now.vy, now.w);
        thread::sleep(pause);
        ctrl.call(OpenLoopMotion::new(now.vx, now.vy, now.w).scaled(0.9))?
            .into_result()?;
        thread::sleep(pause);
    }

    ctrl.call(original)?.into_result()?;
    thread::sleep(pause);
    let speed = state.call(QuerySpeed)?.into_result()?;
    eprintln!("speed restored: vx={} vy={} w={}", speed.vx, speed.vy, speed.w);

    Ok(())
}
