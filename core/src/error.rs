//! Error types for the request client.
//!
//! # Design
//! Failures fall into three groups the caller handles differently: a bad
//! configuration is reported when the setting is made, a transport failure
//! aborts the request, and an application error means the server answered
//! but flagged the payload itself as an error. `Serialization` covers request
//! data that cannot be turned into a body or a query string.
//!
//! There are no retries anywhere; every variant is final for the call that
//! produced it.

use serde_json::Value;
use thiserror::Error;

/// Errors returned by `RequestClient` configuration and request methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A configuration value was rejected, e.g. a certificate path that does
    /// not point at a readable file.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The request never produced a response: bad URL, DNS, connect or TLS
    /// failure. Carries the transport's own error text.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body carried an `error` field. Only produced when error
    /// field detection is enabled.
    #[error("application error: {}", display_error_value(.0))]
    Application(Value),

    /// The request data could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

fn display_error_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
