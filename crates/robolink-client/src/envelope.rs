use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// Key of the mandatory status code in every reply.
pub const RET_CODE: &str = "ret_code";
/// Key of the human-readable failure cause.
pub const ERR_MSG: &str = "err_msg";

/// Decoded JSON reply object.
///
/// Always carries an integer `ret_code` (0 = success). Every other field is
/// passed through untouched for the command to interpret.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    ret_code: i64,
    fields: Map<String, Value>,
}

impl Envelope {
    /// Decode a reply payload.
    pub fn from_slice(payload: &[u8]) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_slice(payload)?;
        Self::from_value(value)
    }

    /// Wrap an already decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let Value::Object(fields) = value else {
            return Err(ProtocolError::NotAnObject);
        };
        let ret_code = fields
            .get(RET_CODE)
            .and_then(Value::as_i64)
            .ok_or(ProtocolError::MissingRetCode)?;
        Ok(Self { ret_code, fields })
    }

    pub fn ret_code(&self) -> i64 {
        self.ret_code
    }

    pub fn is_success(&self) -> bool {
        self.ret_code == 0
    }

    /// The failure cause, when the controller sent one.
    pub fn err_msg(&self) -> Option<&str> {
        self.fields.get(ERR_MSG).and_then(Value::as_str)
    }

    /// Look up a domain field by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// All fields, including `ret_code`.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Deserialize the fields into a typed result. Unknown fields are ignored
    /// by the target type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(Value::Object(self.fields.clone()))
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[test]
    fn success_envelope() {
        let env = Envelope::from_slice(br#"{"ret_code":0,"x":1.5}"#).unwrap();
        assert!(env.is_success());
        assert_eq!(env.ret_code(), 0);
        assert_eq!(env.err_msg(), None);
        assert_eq!(env.get("x"), Some(&json!(1.5)));
    }

    #[test]
    fn failure_envelope_keeps_message() {
        let env = Envelope::from_slice(br#"{"ret_code":1,"err_msg":"busy"}"#).unwrap();
        assert!(!env.is_success());
        assert_eq!(env.ret_code(), 1);
        assert_eq!(env.err_msg(), Some("busy"));
    }

    #[test]
    fn missing_ret_code_is_protocol_error() {
        let err = Envelope::from_slice(br#"{"x":1}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingRetCode));

        let err = Envelope::from_slice(br#"{"ret_code":"0"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingRetCode));
    }

    #[test]
    fn non_object_and_garbage_are_rejected() {
        assert!(matches!(
            Envelope::from_slice(b"[1,2]").unwrap_err(),
            ProtocolError::NotAnObject
        ));
        assert!(matches!(
            Envelope::from_slice(br#"{"ret_code":0"#).unwrap_err(),
            ProtocolError::Json(_)
        ));
        assert!(matches!(
            Envelope::from_slice(b"").unwrap_err(),
            ProtocolError::Json(_)
        ));
    }

    #[test]
    fn decode_ignores_unknown_fields() {
        #[derive(Deserialize)]
        struct Pose {
            x: f64,
        }

        let env = Envelope::from_value(json!({"ret_code": 0, "x": 2.0, "vendor_extra": [1]})).unwrap();
        let pose: Pose = env.decode().unwrap();
        assert_eq!(pose.x, 2.0);
    }
}
