//! Request building, dispatch and response decoding.
//!
//! # Design
//! `RequestClient` owns a `ClientConfig` and a `Transport`. Every verb method
//! funnels into `perform_request`, which runs three steps:
//!
//! 1. `build_request` turns (endpoint, method, data, headers) into an
//!    `HttpRequest` without I/O.
//! 2. The transport executes it. A transport failure ends the call.
//! 3. `parse_response` decodes the body into a `ResponseValue`.
//!
//! Steps 1 and 3 are public so a caller can drive its own I/O between them.
//!
//! Configuration setters take `&mut self` and requests take `&self`, so the
//! configuration cannot change while a request is being built. Sharing one
//! client between threads is fine as long as the transport is `Sync`.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::query::build_query;
use crate::transport::{Transport, UreqTransport};

/// Caller-supplied headers. Keys are unique; they are sent as given and are
/// never merged with the headers the client adds.
pub type Headers = BTreeMap<String, String>;

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseValue {
    /// Any JSON value other than `null`: object, array or scalar.
    Json(Value),
    /// The body was empty, `null`, or not JSON at all.
    Empty,
}

impl ResponseValue {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseValue::Json(value) => Some(value),
            ResponseValue::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ResponseValue::Empty)
    }

    /// The JSON value, with `Empty` mapped to `Value::Null`.
    pub fn into_json(self) -> Value {
        match self {
            ResponseValue::Json(value) => value,
            ResponseValue::Empty => Value::Null,
        }
    }
}

/// Synchronous JSON API client bound to one base URL.
#[derive(Debug, Clone)]
pub struct RequestClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl RequestClient<UreqTransport> {
    pub fn new(base_url: &str) -> Self {
        Self::with_config(ClientConfig::new(base_url))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            config,
            transport: UreqTransport,
        }
    }

    /// Client configured from `API_*` environment variables, see
    /// `ClientConfig::from_env`.
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::with_config(ClientConfig::from_env()?))
    }
}

impl<T> RequestClient<T> {
    /// Replace the transport, keeping the configuration.
    pub fn with_transport<U: Transport>(self, transport: U) -> RequestClient<U> {
        RequestClient {
            config: self.config,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn set_base_url(&mut self, url: &str) -> &mut Self {
        self.config.set_base_url(url);
        self
    }

    /// See `ClientConfig::set_certificate_path`.
    pub fn set_certificate_path<P: AsRef<std::path::Path>>(
        &mut self,
        path: Option<P>,
    ) -> Result<&mut Self, ApiError> {
        self.config.set_certificate_path(path)?;
        Ok(self)
    }

    /// See `ClientConfig::set_credentials`: a token takes precedence over
    /// these credentials on the wire.
    pub fn set_credentials(&mut self, username: &str, password: &str) -> &mut Self {
        self.config.set_credentials(username, password);
        self
    }

    /// See `ClientConfig::set_token`.
    pub fn set_token(&mut self, value: Option<&str>, scheme: &str) -> &mut Self {
        self.config.set_token(value, scheme);
        self
    }

    pub fn set_accept_invalid_certs(&mut self, accept: bool) -> &mut Self {
        self.config.set_accept_invalid_certs(accept);
        self
    }

    pub fn set_detect_error_field(&mut self, detect: bool) -> &mut Self {
        self.config.set_detect_error_field(detect);
        self
    }

    /// Assemble the request for `endpoint` without sending it.
    ///
    /// GET and DELETE put `data` in the query string. POST, PUT and PATCH
    /// send it as a JSON body, except that a JSON string is sent verbatim as
    /// the raw body.
    pub fn build_request(
        &self,
        endpoint: &str,
        method: HttpMethod,
        data: &Value,
        headers: &Headers,
    ) -> Result<HttpRequest, ApiError> {
        let mut url = self.config.join_url(endpoint);
        let mut request_headers: Vec<(String, String)> = headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let body = if method.carries_body() {
            match data {
                Value::String(raw) => Some(raw.clone()),
                Value::Null => {
                    request_headers.push(json_content_type());
                    Some("{}".to_string())
                }
                other => {
                    let body = serde_json::to_string(other)
                        .map_err(|e| ApiError::Serialization(e.to_string()))?;
                    request_headers.push(json_content_type());
                    Some(body)
                }
            }
        } else {
            let query = build_query(data)?;
            if !query.is_empty() {
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(&query);
            }
            None
        };

        if let Some(token) = self.config.token() {
            request_headers.push(("Authorization".to_string(), token.header_value()));
        }

        Ok(HttpRequest {
            method,
            url,
            headers: request_headers,
            body,
            credentials: self.config.credentials().cloned(),
            tls: self.config.tls_mode(),
        })
    }

    /// Decode a response body.
    ///
    /// The status code does not affect the result. With error field
    /// detection enabled, an object carrying `error` becomes
    /// `ApiError::Application`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<ResponseValue, ApiError> {
        let body = response.body.trim();
        if body.is_empty() {
            return Ok(ResponseValue::Empty);
        }

        let value: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) => {
                warn!(status = response.status, error = %e, "response body is not JSON");
                return Ok(ResponseValue::Empty);
            }
        };

        if self.config.detect_error_field() {
            if let Some(error) = value.get("error") {
                return Err(ApiError::Application(error.clone()));
            }
        }

        Ok(match value {
            Value::Null => ResponseValue::Empty,
            value => ResponseValue::Json(value),
        })
    }
}

impl<T: Transport> RequestClient<T> {
    pub fn get(&self, endpoint: &str, data: &Value, headers: &Headers) -> Result<ResponseValue, ApiError> {
        self.perform_request(endpoint, HttpMethod::Get, data, headers)
    }

    pub fn post(&self, endpoint: &str, data: &Value, headers: &Headers) -> Result<ResponseValue, ApiError> {
        self.perform_request(endpoint, HttpMethod::Post, data, headers)
    }

    pub fn put(&self, endpoint: &str, data: &Value, headers: &Headers) -> Result<ResponseValue, ApiError> {
        self.perform_request(endpoint, HttpMethod::Put, data, headers)
    }

    pub fn patch(&self, endpoint: &str, data: &Value, headers: &Headers) -> Result<ResponseValue, ApiError> {
        self.perform_request(endpoint, HttpMethod::Patch, data, headers)
    }

    pub fn delete(&self, endpoint: &str, data: &Value, headers: &Headers) -> Result<ResponseValue, ApiError> {
        self.perform_request(endpoint, HttpMethod::Delete, data, headers)
    }

    /// Build, send and decode one request.
    pub fn perform_request(
        &self,
        endpoint: &str,
        method: HttpMethod,
        data: &Value,
        headers: &Headers,
    ) -> Result<ResponseValue, ApiError> {
        let request = self.build_request(endpoint, method, data, headers)?;
        debug!(method = %request.method, url = %request.url, "sending request");

        let response = self.transport.execute(&request).inspect_err(|e| {
            debug!(method = %request.method, url = %request.url, error = %e, "request failed");
        })?;
        debug!(status = response.status, bytes = response.body.len(), "received response");

        self.parse_response(response)
    }
}

fn json_content_type() -> (String, String) {
    ("Content-Type".to_string(), "application/json".to_string())
}
