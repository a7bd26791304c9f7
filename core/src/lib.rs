//! Synchronous JSON API request helper.
//!
//! # Overview
//! `RequestClient` issues GET/POST/PUT/PATCH/DELETE requests against a
//! configured base URL, attaches an `Authorization` token and/or basic
//! credentials, pins a CA certificate when one is configured, sends request
//! data as JSON, and decodes JSON responses into a `ResponseValue`.
//!
//! # Design
//! - Request assembly (`build_request`) and response decoding
//!   (`parse_response`) are pure; only the `Transport` touches the network
//!   (host-does-IO pattern). `UreqTransport` is the default.
//! - Configuration is an owned `ClientConfig` value; setters need `&mut`.
//! - TLS verification is on unless a certificate is pinned or the caller
//!   explicitly opts out with `accept_invalid_certs`.
//!
//! ```no_run
//! use api_core::{Headers, RequestClient};
//! use serde_json::json;
//!
//! let mut client = RequestClient::new("https://jsonplaceholder.typicode.com/");
//! client.set_token(Some("abc"), "bearer");
//! let post = client.get("posts/1", &serde_json::Value::Null, &Headers::new())?;
//! let created = client.post("posts", &json!({"title": "foo"}), &Headers::new())?;
//! # Ok::<(), api_core::ApiError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod query;
pub mod transport;

pub use client::{Headers, RequestClient, ResponseValue};
pub use config::{ClientConfig, ClientConfigBuilder, Token, DEFAULT_TOKEN_SCHEME};
pub use error::ApiError;
pub use http::{Credentials, HttpMethod, HttpRequest, HttpResponse, TlsMode};
pub use transport::{Transport, UreqTransport};
