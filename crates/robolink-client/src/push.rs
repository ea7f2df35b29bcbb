use robolink_frame::encode;
use robolink_transport::{ApiPort, Dialer, TcpDialer};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::channel::CommandChannel;
use crate::command::{Ack, ApplicationError, Operation, Outcome};
use crate::connection::{Connection, ConnectionConfig, ConnectionState};
use crate::envelope::RET_CODE;
use crate::error::{ClientError, ProtocolError, Result, ValidationError};

/// Telemetry fields requested when the caller does not choose any.
pub const DEFAULT_PUSH_FIELDS: &[&str] = &[
    "x",
    "y",
    "angle",
    "confidence",
    "vx",
    "vy",
    "w",
    "current_station",
    "is_stop",
    "fork",
    "target_point",
    "target_label",
    "target_id",
    "target_dist",
    "task_status",
    "running_status",
    "task_type",
    "emergency",
    "charging",
    "battery_level",
    "map",
    "battery_temp",
    "voltage",
    "current",
];

/// Default push interval in milliseconds.
pub const DEFAULT_PUSH_INTERVAL_MS: u64 = 1000;

/// Choose the push interval and fields (9300).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurePush {
    /// Milliseconds between pushes.
    pub interval: u64,
    pub included_fields: Vec<String>,
}

impl ConfigurePush {
    pub fn new(interval: u64, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            interval,
            included_fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Add fields to the request, skipping ones already present.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        for field in fields {
            let field = field.into();
            if !self.included_fields.contains(&field) {
                self.included_fields.push(field);
            }
        }
        self
    }
}

impl Default for ConfigurePush {
    fn default() -> Self {
        Self::new(DEFAULT_PUSH_INTERVAL_MS, DEFAULT_PUSH_FIELDS.iter().copied())
    }
}

impl Operation for ConfigurePush {
    const OPCODE: u16 = 9300;
    const NAME: &'static str = "configure-push";
    const PORT: ApiPort = ApiPort::Push;
    type Output = Ack;

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.interval == 0 {
            return Err(ValidationError::Invalid {
                field: "interval",
                reason: "must be at least 1 ms".to_owned(),
            });
        }
        if self.included_fields.is_empty() {
            return Err(ValidationError::Empty("included_fields"));
        }
        Ok(())
    }
}

/// One telemetry frame from the push port.
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub message_type: u16,
    pub fields: Map<String, Value>,
}

impl PushMessage {
    fn from_payload(message_type: u16, payload: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(payload).map_err(ProtocolError::from)?;
        match value {
            Value::Object(fields) => Ok(Self {
                message_type,
                fields,
            }),
            _ => Err(ProtocolError::NotAnObject.into()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Decode the fields into a typed view, e.g. [`crate::ops::Pose`].
    pub fn decode<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        T::deserialize(Value::Object(self.fields.clone()))
    }
}

/// Receiver for the vehicle's push telemetry.
///
/// Uses its own connection; command traffic never shares it. Push frames are
/// not replies, so they need not carry `ret_code`. The last accepted
/// configuration is sent again whenever the connection has to be re-opened.
pub struct PushListener<D: Dialer = TcpDialer> {
    channel: CommandChannel<D>,
    pending: Option<PushMessage>,
    config: Option<ConfigurePush>,
}

impl PushListener<TcpDialer> {
    pub fn connect(config: ConnectionConfig) -> Result<Self> {
        Ok(Self::new(Connection::open(config)?))
    }

    /// Connect to the PUSH port of `host`.
    pub fn open(host: &str) -> Result<Self> {
        Self::connect(ConnectionConfig::api(host, ApiPort::Push))
    }
}

impl<D: Dialer> PushListener<D> {
    pub fn new(connection: Connection<D>) -> Self {
        Self {
            channel: CommandChannel::new(connection),
            pending: None,
            config: None,
        }
    }

    /// Send the push configuration and read the controller's answer.
    ///
    /// Some controllers answer with a `ret_code` reply, others start pushing
    /// immediately; a first frame without `ret_code` is kept and returned by
    /// the next [`next_message`](Self::next_message).
    pub fn configure(&mut self, config: &ConfigurePush) -> Result<Outcome<Ack>> {
        config
            .validate()
            .map_err(|source| ClientError::Validation {
                command: ConfigurePush::NAME,
                source,
            })?;
        let body = serde_json::to_vec(config)?;
        let reply = self
            .channel
            .exchange_frame(1, ConfigurePush::OPCODE, Some(body.as_slice()))?;
        let message = PushMessage::from_payload(reply.message_type, &reply.payload)?;

        let outcome = match message.get(RET_CODE).and_then(Value::as_i64) {
            Some(0) => Outcome::Success(Ack {}),
            Some(ret_code) => Outcome::Failure(ApplicationError {
                ret_code,
                err_msg: message
                    .get("err_msg")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
            }),
            None => {
                debug!("push started without an acknowledgement");
                self.pending = Some(message);
                Outcome::Success(Ack {})
            }
        };
        info!(
            interval_ms = config.interval,
            fields = config.included_fields.len(),
            accepted = outcome.is_success(),
            "push configured"
        );
        self.config = outcome.is_success().then(|| config.clone());
        Ok(outcome)
    }

    /// Block until the next telemetry frame arrives.
    ///
    /// After a dropped connection the stored configuration is resent on the
    /// new one before reading.
    pub fn next_message(&mut self) -> Result<PushMessage> {
        if self.pending.is_none() && self.channel.state() != ConnectionState::Connected {
            self.reconfigure()?;
        }
        if let Some(message) = self.pending.take() {
            return Ok(message);
        }
        let frame = self.channel.receive_frame()?;
        PushMessage::from_payload(frame.message_type, &frame.payload)
    }

    fn reconfigure(&mut self) -> Result<()> {
        let Some(config) = self.config.clone() else {
            return Ok(());
        };
        debug!(endpoint = %self.channel.endpoint(), "resending push configuration");
        if let Outcome::Failure(err) = self.configure(&config)? {
            warn!(error = %err, "push configuration rejected after reconnect");
        }
        Ok(())
    }

    /// Send a raw frame on the push connection without waiting.
    pub fn send_raw(&self, message_type: u16, payload: Option<&[u8]>) -> Result<()> {
        let wire = encode(0, message_type, payload).map_err(ProtocolError::from)?;
        self.channel.send_frame(&wire)
    }

    pub fn close(&self) {
        self.channel.close();
    }
}

impl<D: Dialer> Iterator for PushListener<D> {
    type Item = Result<PushMessage>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_message())
    }
}

#[cfg(test)]
mod tests {
    use robolink_frame::decode_frame;
    use robolink_transport::{Endpoint, RetryPolicy};
    use serde_json::json;

    use super::*;
    use crate::testing::{reply_frame, ScriptedDialer, ScriptedStream};

    fn listener(stream: &ScriptedStream) -> PushListener<ScriptedDialer> {
        listener_over(&[stream])
    }

    fn listener_over(streams: &[&ScriptedStream]) -> PushListener<ScriptedDialer> {
        let config = ConnectionConfig::new(Endpoint::api("agv.test", ApiPort::Push))
            .with_retry(RetryPolicy::no_retry());
        let dials = streams.iter().map(|stream| Ok((*stream).clone())).collect();
        PushListener::new(Connection::with_dialer(config, ScriptedDialer::new(dials)))
    }

    fn sent_requests(stream: &ScriptedStream) -> Vec<robolink_frame::Frame> {
        let mut sent = bytes::BytesMut::from(stream.written().as_slice());
        let mut frames = Vec::new();
        while let Some(frame) = decode_frame(&mut sent, usize::MAX).unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn default_config_lists_all_fields() {
        let cfg = ConfigurePush::default();
        assert_eq!(cfg.interval, 1000);
        assert_eq!(cfg.included_fields.len(), 24);
        assert!(cfg.validate().is_ok());

        let cfg = cfg.with_fields(["x", "odo"]);
        assert_eq!(cfg.included_fields.len(), 25);
    }

    #[test]
    fn zero_interval_rejected() {
        let cfg = ConfigurePush::new(0, ["x"]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn configure_then_stream_messages() {
        let stream = ScriptedStream::new();
        stream.push_inbound(&reply_frame(19300, r#"{"ret_code":0}"#));
        stream.push_inbound(&reply_frame(19301, r#"{"x":1.0,"y":2.0}"#));
        stream.push_inbound(&reply_frame(19301, r#"{"x":1.5,"y":2.0}"#));
        let mut listener = listener(&stream);

        let outcome = listener
            .configure(&ConfigurePush::new(500, ["x", "y"]))
            .unwrap();
        assert!(outcome.is_success());

        let mut sent = bytes::BytesMut::from(stream.written().as_slice());
        let request = decode_frame(&mut sent, usize::MAX).unwrap().unwrap();
        assert_eq!(request.message_type, 9300);
        let body: Value = serde_json::from_slice(&request.payload).unwrap();
        assert_eq!(body, json!({"interval": 500, "included_fields": ["x", "y"]}));

        let first = listener.next().unwrap().unwrap();
        assert_eq!(first.get("x"), Some(&json!(1.0)));
        let second = listener.next_message().unwrap();
        assert_eq!(second.get("x"), Some(&json!(1.5)));
    }

    #[test]
    fn configuration_is_resent_after_reconnect() {
        let first = ScriptedStream::new();
        first.push_inbound(&reply_frame(19300, r#"{"ret_code":0}"#));
        first.push_inbound(&reply_frame(19301, r#"{"x":1.0}"#));
        let second = ScriptedStream::new();
        second.push_inbound(&reply_frame(19300, r#"{"ret_code":0}"#));
        second.push_inbound(&reply_frame(19301, r#"{"x":2.0}"#));
        let mut listener = listener_over(&[&first, &second]);

        listener
            .configure(&ConfigurePush::new(250, ["x"]))
            .unwrap();
        assert_eq!(listener.next_message().unwrap().get("x"), Some(&json!(1.0)));

        let err = listener.next_message().unwrap_err();
        assert!(err.is_connection_fault());

        let message = listener.next_message().unwrap();
        assert_eq!(message.get("x"), Some(&json!(2.0)));
        let resent = sent_requests(&second);
        assert_eq!(resent.len(), 1);
        assert_eq!(resent[0].message_type, 9300);
        let body: Value = serde_json::from_slice(&resent[0].payload).unwrap();
        assert_eq!(body, json!({"interval": 250, "included_fields": ["x"]}));
    }

    #[test]
    fn unconfigured_listener_reconnects_without_sending() {
        let stream = ScriptedStream::new();
        stream.push_inbound(&reply_frame(19301, r#"{"y":3.0}"#));
        let mut listener = listener(&stream);

        assert_eq!(listener.next_message().unwrap().get("y"), Some(&json!(3.0)));
        assert!(stream.written().is_empty());
    }

    #[test]
    fn unacknowledged_first_push_is_kept() {
        let stream = ScriptedStream::new();
        stream.push_inbound(&reply_frame(19301, r#"{"battery_level":0.5}"#));
        let mut listener = listener(&stream);

        assert!(listener.configure(&ConfigurePush::default()).unwrap().is_success());
        let message = listener.next_message().unwrap();
        assert_eq!(message.get("battery_level"), Some(&json!(0.5)));
    }

    #[test]
    fn rejected_configuration_is_failure() {
        let stream = ScriptedStream::new();
        stream.push_inbound(&reply_frame(19300, r#"{"ret_code":40000,"err_msg":"bad field"}"#));
        let mut listener = listener(&stream);

        let outcome = listener.configure(&ConfigurePush::default()).unwrap();
        let err = outcome.failure().unwrap();
        assert_eq!(err.ret_code, 40000);
        assert_eq!(err.err_msg.as_deref(), Some("bad field"));
    }

    #[test]
    fn typed_view_of_push_message() {
        let message = PushMessage::from_payload(19301, br#"{"x":3.0,"y":4.0,"angle":0.1}"#).unwrap();
        let pose: crate::ops::Pose = message.decode().unwrap();
        assert_eq!(pose.x, 3.0);
        assert_eq!(pose.angle, 0.1);
        assert!(PushMessage::from_payload(19301, b"[]").is_err());
    }
}
