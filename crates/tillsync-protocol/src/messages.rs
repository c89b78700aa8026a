//! Request and response envelopes.
//!
//! Every call is a POST of a [`Request`] and every answer is a [`Response`].
//! Both are JSON objects with camelCase keys.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ProtocolError, Result};

/// Outbound envelope: `{data?, dataVersion?, token?}`.
///
/// Absent fields are omitted from the body, never sent as null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    pub data: Option<Value>,
    pub data_version: Option<String>,
    pub token: Option<String>,
}

impl Request {
    /// The JSON body for the transport.
    pub fn into_body(self) -> Value {
        let mut body = Map::new();
        if let Some(data) = self.data {
            body.insert("data".into(), data);
        }
        if let Some(version) = self.data_version {
            body.insert("dataVersion".into(), Value::String(version));
        }
        if let Some(token) = self.token {
            body.insert("token".into(), Value::String(token));
        }
        Value::Object(body)
    }
}

/// The only two statuses a well-formed response may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// Error object carried by an `"error"` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl ErrorPayload {
    /// Used when an `"error"` response has no error object.
    pub fn unknown() -> Self {
        Self {
            code: "UNKNOWN_ERROR".into(),
            message: "the server reported an error without details".into(),
        }
    }
}

/// Inbound envelope.
///
/// `business` and `deviceRegister` keep "present but null" apart from
/// "absent": an absent key is `None`, a null one is `Some(Value::Null)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status: ResponseStatus,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<ErrorPayload>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub data_version: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub business: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub device_register: Option<Value>,
}

impl Response {
    /// Validate a decoded body.
    pub fn from_value(body: Value) -> Result<Self> {
        serde_json::from_value(body).map_err(|e| ProtocolError::InvalidResponse(e.to_string()))
    }
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_omits_absent_fields() {
        assert_eq!(Request::default().into_body(), json!({}));

        let body = Request {
            data: Some(json!({"a": 1})),
            data_version: Some("V1".into()),
            token: None,
        }
        .into_body();
        assert_eq!(body, json!({"data": {"a": 1}, "dataVersion": "V1"}));
    }

    #[test]
    fn test_response_minimal() {
        let response = Response::from_value(json!({"status": "ok"})).unwrap();
        assert_eq!(response.status, ResponseStatus::Ok);
        assert!(response.data.is_none());
        assert!(response.business.is_none());
        assert!(response.device_register.is_none());
    }

    #[test]
    fn test_response_null_register_is_present() {
        let response =
            Response::from_value(json!({"status": "ok", "deviceRegister": null})).unwrap();
        assert_eq!(response.device_register, Some(Value::Null));
        assert!(response.business.is_none());
    }

    #[test]
    fn test_response_error_payload() {
        let response =
            Response::from_value(json!({"status": "error", "error": {"code": "AUTH_FAILED"}}))
                .unwrap();
        assert_eq!(response.status, ResponseStatus::Error);
        let error = response.error.unwrap();
        assert_eq!(error.code, "AUTH_FAILED");
        assert_eq!(error.message, "");
    }

    #[test]
    fn test_response_rejects_bad_shapes() {
        for body in [
            json!({"status": "pending"}),
            json!({"data": 1}),
            json!("ok"),
            json!({"status": "ok", "token": 5}),
        ] {
            assert!(matches!(
                Response::from_value(body),
                Err(ProtocolError::InvalidResponse(_))
            ));
        }
    }
}
