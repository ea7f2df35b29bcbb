use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use robolink_client::ops::{GotoStation, QueryBattery, QueryPose};
use robolink_client::{
    ClientError, Command, CommandChannel, CommandState, ConfigurePush, Connection,
    ConnectionConfig, ConnectionState, Endpoint, Exchange, Outcome, PushListener, RetryPolicy,
    StatusSequencer, TaskStatus,
};
use robolink_frame::{Frame, FrameReader, FrameWriter};
use robolink_transport::TransportError;
use serde_json::{json, Value};

/// What the fake controller does with one request.
enum Reply {
    Json(Value),
    /// Keep the socket open without answering.
    Hang,
    /// Close the socket without answering.
    Drop,
}

/// Minimal controller: replies with `opcode + 10000`, one thread per connection.
struct FakeAgv {
    addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Frame>>>,
}

impl FakeAgv {
    fn spawn<F>(handler: F) -> Self
    where
        F: Fn(usize, &Frame) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        let addr = listener.local_addr().expect("listener should have an address");
        let accepted = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(handler);

        {
            let accepted = Arc::clone(&accepted);
            let requests = Arc::clone(&requests);
            thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(stream) = stream else { break };
                    let index = accepted.fetch_add(1, Ordering::SeqCst);
                    let handler = Arc::clone(&handler);
                    let requests = Arc::clone(&requests);
                    thread::spawn(move || serve(stream, index, handler.as_ref(), &requests));
                }
            });
        }

        Self {
            addr,
            accepted,
            requests,
        }
    }

    fn config(&self) -> ConnectionConfig {
        ConnectionConfig::new(Endpoint::new("127.0.0.1", self.addr.port()))
            .with_retry(RetryPolicy::fixed(3, Duration::from_millis(20)))
            .with_read_timeout(Some(Duration::from_secs(5)))
    }

    fn channel(&self) -> CommandChannel {
        CommandChannel::connect(self.config()).expect("channel should connect")
    }

    fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    fn requests(&self) -> Vec<Frame> {
        self.requests.lock().expect("request log lock").clone()
    }
}

fn serve<F>(stream: TcpStream, index: usize, handler: &F, requests: &Mutex<Vec<Frame>>)
where
    F: Fn(usize, &Frame) -> Reply,
{
    let mut reader = FrameReader::new(stream.try_clone().expect("stream should clone"));
    let mut writer = FrameWriter::new(stream);
    while let Ok(frame) = reader.read_frame() {
        requests.lock().expect("request log lock").push(frame.clone());
        match handler(index, &frame) {
            Reply::Json(value) => {
                let body = serde_json::to_vec(&value).expect("reply should serialize");
                if writer
                    .send(frame.request_id, frame.message_type + 10000, &body)
                    .is_err()
                {
                    return;
                }
            }
            Reply::Hang => {
                thread::sleep(Duration::from_secs(2));
                return;
            }
            Reply::Drop => return,
        }
    }
}

fn payload(frame: &Frame) -> Value {
    serde_json::from_slice(&frame.payload).expect("request payload should be JSON")
}

#[test]
fn goto_station_success() {
    let agv = FakeAgv::spawn(|_, _| Reply::Json(json!({"ret_code": 0})));
    let channel = agv.channel();

    let mut cmd = Command::new(GotoStation::new("LM15").with_max_speed(0.5));
    let outcome = cmd.execute(&channel).expect("exchange should complete");
    assert!(outcome.is_success());
    assert_eq!(cmd.state(), CommandState::Succeeded);

    let requests = agv.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].message_type, 3051);
    assert_eq!(payload(&requests[0]), json!({"id": "LM15", "max_speed": 0.5}));
}

#[test]
fn application_failure_carries_err_msg() {
    let agv = FakeAgv::spawn(|_, _| Reply::Json(json!({"ret_code": 1, "err_msg": "busy"})));
    let channel = agv.channel();

    let outcome = channel
        .call(GotoStation::new("LM15"))
        .expect("exchange should complete");
    match outcome {
        Outcome::Failure(err) => {
            assert_eq!(err.ret_code, 1);
            assert_eq!(err.err_msg.as_deref(), Some("busy"));
        }
        Outcome::Success(_) => panic!("expected failure outcome"),
    }
    assert_eq!(channel.state(), ConnectionState::Connected);
}

#[test]
fn validation_failure_sends_nothing() {
    let agv = FakeAgv::spawn(|_, _| Reply::Json(json!({"ret_code": 0})));
    let channel = CommandChannel::new(Connection::new(agv.config()));

    let err = channel
        .call(GotoStation::default())
        .expect_err("missing id should fail validation");
    assert!(err.is_validation());
    assert_eq!(channel.state(), ConnectionState::Disconnected);

    channel
        .call(QueryPose)
        .expect("valid query should still work");
    let requests = agv.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].message_type, 1004);
}

#[test]
fn concurrent_callers_are_serialized() {
    let agv = FakeAgv::spawn(|_, frame| {
        thread::sleep(Duration::from_millis(5));
        let id = payload(frame)["id"].clone();
        Reply::Json(json!({"ret_code": 0, "echo": id}))
    });
    let channel = Arc::new(agv.channel());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                for round in 0..5 {
                    let id = format!("LM{i}-{round}");
                    let reply = channel
                        .exchange(0, 3051, Some(&json!({ "id": id })))
                        .expect("exchange should complete");
                    assert_eq!(reply.get("echo"), Some(&json!(id)));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("caller thread should not panic");
    }

    assert_eq!(agv.requests().len(), 40);
    assert_eq!(agv.accepted(), 1);
}

#[test]
fn read_fault_reconnects_and_resends_once() {
    let agv = FakeAgv::spawn(|connection, _| {
        if connection == 0 {
            Reply::Drop
        } else {
            Reply::Json(json!({"ret_code": 0, "battery_level": 0.75}))
        }
    });
    let channel = agv.channel();

    let outcome = channel.call(QueryBattery).expect("resend should succeed");
    let battery = outcome.into_result().expect("battery query should succeed");
    assert_eq!(battery.battery_level, 0.75);
    assert_eq!(agv.accepted(), 2);
    assert_eq!(agv.requests().len(), 2);
}

#[test]
fn reply_timeout_disconnects_then_recovers() {
    let agv = FakeAgv::spawn(|connection, _| {
        if connection == 0 {
            Reply::Hang
        } else {
            Reply::Json(json!({"ret_code": 0}))
        }
    });
    let channel = agv.channel();
    channel
        .set_request_timeout(Some(Duration::from_millis(150)))
        .expect("timeout should apply");

    let err = channel
        .exchange(0, 1004, None)
        .expect_err("hung controller should time out");
    assert!(matches!(err, ClientError::Timeout(d) if d == Duration::from_millis(150)));
    assert_eq!(channel.state(), ConnectionState::Disconnected);

    let envelope = channel
        .exchange(0, 1004, None)
        .expect("next exchange should reconnect");
    assert!(envelope.is_success());
    assert_eq!(agv.accepted(), 2);
}

#[test]
fn connect_gives_up_after_retry_budget() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        listener.local_addr().expect("address").port()
    };
    let config = ConnectionConfig::new(Endpoint::new("127.0.0.1", port))
        .with_retry(RetryPolicy::fixed(3, Duration::from_millis(10)));

    let err = CommandChannel::connect(config)
        .err()
        .expect("nothing is listening");
    assert!(matches!(
        err,
        ClientError::Connection(TransportError::Connect { attempts: 3, .. })
    ));
}

#[test]
fn status_snapshot_over_tcp() {
    let agv = FakeAgv::spawn(|_, frame| {
        Reply::Json(match frame.message_type {
            1007 => json!({"ret_code": 0, "battery_level": 0.5, "voltage": 50.0, "current": 2.0}),
            1004 => json!({"ret_code": 0, "x": 4.0, "y": 2.0, "current_station": "LM15"}),
            1020 => json!({"ret_code": 0, "task_status": 2, "target_id": "LM16"}),
            1009 => json!({"ret_code": 1, "err_msg": "no laser"}),
            _ => json!({"ret_code": 0}),
        })
    });
    let channel = agv.channel();

    let report = StatusSequencer::new(&channel)
        .snapshot()
        .expect("snapshot should complete");
    let battery = report.battery.expect("battery reading");
    assert_eq!(battery.power(), 100.0);
    assert_eq!(report.pose.expect("pose reading").current_station, "LM15");
    let navigation = report.navigation.expect("navigation reading");
    assert_eq!(navigation.task_status, Some(TaskStatus::Running));
    assert!(report.lasers.is_none());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].opcode, 1009);
    assert_eq!(agv.requests().len(), 8);
}

#[test]
fn push_listener_streams_telemetry() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
    let port = listener.local_addr().expect("address").port();
    thread::spawn(move || {
        let (stream, _) = listener.accept().expect("push client should connect");
        let mut reader = FrameReader::new(stream.try_clone().expect("stream should clone"));
        let mut writer = FrameWriter::new(stream);
        let request = reader.read_frame().expect("configure request");
        assert_eq!(request.message_type, 9300);
        writer
            .send(1, 19300, br#"{"ret_code":0}"#)
            .expect("ack should send");
        for i in 0..3 {
            let body = format!(r#"{{"x":{i}.0,"y":0.0,"battery_level":0.9}}"#);
            writer
                .send(0, 19301, body.as_bytes())
                .expect("push should send");
        }
    });

    let config = ConnectionConfig::new(Endpoint::new("127.0.0.1", port))
        .with_retry(RetryPolicy::no_retry())
        .with_read_timeout(Some(Duration::from_secs(5)));
    let mut push = PushListener::connect(config).expect("push should connect");
    let outcome = push
        .configure(&ConfigurePush::new(200, ["x", "y", "battery_level"]))
        .expect("configure should complete");
    assert!(outcome.is_success());

    let xs: Vec<f64> = push
        .by_ref()
        .take(3)
        .map(|message| {
            let message = message.expect("push message");
            message.get("x").and_then(Value::as_f64).expect("x field")
        })
        .collect();
    assert_eq!(xs, vec![0.0, 1.0, 2.0]);
}
