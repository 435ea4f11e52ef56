//! Uniform result wrapper for Streamlabs API responses
//!
//! Every response, successful or not, is returned as an [`Envelope`]: the
//! remote JSON object annotated with request metadata under reserved keys.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::ErrorKind;

pub const SUCCESS_KEY: &str = "_success";
pub const TYPE_KEY: &str = "_type";
pub const POST_KEY: &str = "_post";
pub const URL_KEY: &str = "_url";
pub const HTTP_KEY: &str = "_http";
pub const EXCEPTION_KEY: &str = "_exception";
pub const EXCEPTION_MESSAGE_KEY: &str = "_exceptionMessage";

/// Request details recorded alongside a response
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    /// HTTP verb, e.g. `GET`
    pub request_type: String,
    /// Form body sent with the request (empty for unauthenticated calls)
    pub posted_body: String,
    /// API path the request targeted
    pub url: String,
    /// Transport-level status code
    pub http_status: u16,
}

/// Failure attached to an envelope
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeFailure {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Envelope {
    pub success: bool,
    pub request_type: String,
    pub posted_body: String,
    pub url: String,
    pub http_status: u16,
    pub exception_kind: Option<String>,
    pub exception_message: Option<String>,
    /// Remote payload, with the reserved metadata keys written into it
    pub payload: Map<String, Value>,
}

impl Envelope {
    /// Annotate `payload` with request metadata.
    ///
    /// The reserved keys are always overwritten, even when the remote payload
    /// already carried them. `success` is false exactly when `failure` is set.
    pub fn wrap(
        mut payload: Map<String, Value>,
        meta: RequestMeta,
        failure: Option<EnvelopeFailure>,
    ) -> Self {
        let success = failure.is_none();
        let exception_kind = failure.as_ref().map(|f| f.kind.as_str().to_string());
        let exception_message = failure.map(|f| f.message);

        payload.insert(SUCCESS_KEY.to_string(), Value::Bool(success));
        payload.insert(
            TYPE_KEY.to_string(),
            Value::String(meta.request_type.clone()),
        );
        payload.insert(POST_KEY.to_string(), Value::String(meta.posted_body.clone()));
        payload.insert(URL_KEY.to_string(), Value::String(meta.url.clone()));
        payload.insert(HTTP_KEY.to_string(), Value::from(meta.http_status));
        payload.insert(
            EXCEPTION_KEY.to_string(),
            exception_kind.clone().map_or(Value::Null, Value::String),
        );
        payload.insert(
            EXCEPTION_MESSAGE_KEY.to_string(),
            exception_message.clone().map_or(Value::Null, Value::String),
        );

        Self {
            success,
            request_type: meta.request_type,
            posted_body: meta.posted_body,
            url: meta.url,
            http_status: meta.http_status,
            exception_kind,
            exception_message,
            payload,
        }
    }

    /// Wrap a response body that could not be decoded as a JSON object
    pub fn undecodable(raw_body: String, meta: RequestMeta, reason: String) -> Self {
        let mut payload = Map::new();
        payload.insert("error".to_string(), Value::String(raw_body));
        Self::wrap(
            payload,
            meta,
            Some(EnvelopeFailure {
                kind: ErrorKind::Decode,
                message: reason,
            }),
        )
    }

    /// Look up a payload field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.payload.get(field)
    }

    pub fn has(&self, field: &str) -> bool {
        self.payload.contains_key(field)
    }

    /// The annotated payload as a JSON value
    pub fn to_json(&self) -> Value {
        Value::Object(self.payload.clone())
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.payload.serialize(serializer)
    }
}
