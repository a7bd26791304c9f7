//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data.
//! `RequestClient::build_request` produces an `HttpRequest` without touching
//! the network, a `Transport` executes it, and
//! `RequestClient::parse_response` decodes the resulting `HttpResponse`.
//! Keeping the assembly step pure means every header, query string and TLS
//! decision can be asserted in unit tests.
//!
//! All fields use owned types (`String`, `Vec`, `PathBuf`) so a request can be
//! stored, cloned or handed to another thread freely.

use std::fmt;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// The exact verb as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether request data travels in the body (`true`) or in the query
    /// string (`false`).
    pub fn carries_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Username/password pair handed to the transport for basic authentication.
///
/// The password is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The `user:password` form used by basic authentication.
    pub fn userpwd(&self) -> String {
        format!("{}:{}", self.username, self.password)
    }

    /// Value for an `Authorization` header carrying these credentials.
    pub fn basic_header(&self) -> String {
        format!("Basic {}", STANDARD.encode(self.userpwd()))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How the transport verifies the server's TLS certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Verify against the transport's default root store.
    Verify,
    /// Verify against the CA certificate(s) in this file only.
    Pinned(PathBuf),
    /// Skip peer and hostname verification entirely.
    Disabled,
}

/// An HTTP request described as plain data.
///
/// Headers are an ordered list rather than a map: caller headers and
/// synthesized headers are never merged, so the same name may appear twice.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub credentials: Option<Credentials>,
    pub tls: TlsMode,
}

impl HttpRequest {
    /// All values of header `name`, compared case-insensitively.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header_values(name).next().is_some()
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}
