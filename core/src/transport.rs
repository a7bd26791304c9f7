//! Executing `HttpRequest` values over the network.
//!
//! # Design
//! `Transport` is the single I/O seam of the crate. `RequestClient` only ever
//! builds and parses plain data; whatever implements `Transport` performs the
//! round-trip. `UreqTransport` is the blocking default. Tests and embedders
//! can substitute their own implementation.
//!
//! A fresh `ureq` agent is built per request because the TLS settings are a
//! property of the request, not of a long-lived connection pool.
//!
//! Once a response arrives the call has succeeded at the transport level:
//! the body is read without a size cap and decoded lossily, so an oversized
//! or non-UTF-8 body reaches `parse_response` instead of failing here.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};
use ureq::http::Response;
use ureq::tls::{Certificate, PemItem, RootCerts, TlsConfig};
use ureq::typestate::WithBody;
use ureq::{Agent, Body, RequestBuilder};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, TlsMode};

/// Executes one request and returns the raw response.
///
/// Implementations must return `Err(ApiError::Transport(_))` when no
/// response was obtained, and `Ok` for every response regardless of status.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = build_agent(&request.tls)?;

        let mut headers = request.headers.clone();
        if let Some(credentials) = &request.credentials {
            // An explicit Authorization header takes precedence, as with curl.
            if request.has_header("authorization") {
                debug!("authorization header present, not sending basic credentials");
            } else {
                headers.push(("Authorization".to_string(), credentials.basic_header()));
            }
        }

        let url = request.url.as_str();
        let result = match request.method {
            HttpMethod::Get => with_headers(agent.get(url), &headers).call(),
            HttpMethod::Delete => with_headers(agent.delete(url), &headers).call(),
            HttpMethod::Post => send(with_headers(agent.post(url), &headers), request.body.as_deref()),
            HttpMethod::Put => send(with_headers(agent.put(url), &headers), request.body.as_deref()),
            HttpMethod::Patch => send(with_headers(agent.patch(url), &headers), request.body.as_deref()),
        };
        let mut response = result?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let bytes = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn build_agent(tls: &TlsMode) -> Result<Agent, ApiError> {
    let tls_config = match tls {
        TlsMode::Verify => TlsConfig::builder().build(),
        TlsMode::Disabled => {
            warn!("TLS certificate verification is disabled for this request");
            TlsConfig::builder().disable_verification(true).build()
        }
        TlsMode::Pinned(path) => {
            let certs = load_certificates(path)?;
            TlsConfig::builder()
                .root_certs(RootCerts::Specific(Arc::new(certs)))
                .build()
        }
    };

    Ok(Agent::config_builder()
        .http_status_as_error(false)
        .tls_config(tls_config)
        .build()
        .new_agent())
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send(builder: RequestBuilder<WithBody>, body: Option<&str>) -> Result<Response<Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

/// Read the CA certificate(s) at `path`, PEM or DER encoded.
fn load_certificates(path: &Path) -> Result<Vec<Certificate<'static>>, ApiError> {
    let bytes = fs::read(path).map_err(|e| {
        ApiError::Transport(format!("failed to read certificate {}: {e}", path.display()))
    })?;
    if bytes.is_empty() {
        return Err(ApiError::Transport(format!(
            "certificate file {} is empty",
            path.display()
        )));
    }

    if !contains(&bytes, b"-----BEGIN") {
        return Ok(vec![Certificate::from_der(&bytes).to_owned()]);
    }

    let mut certs = Vec::new();
    for item in ureq::tls::parse_pem(&bytes) {
        if let PemItem::Certificate(cert) = item? {
            certs.push(cert.to_owned());
        }
    }
    if certs.is_empty() {
        return Err(ApiError::Transport(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    debug!(count = certs.len(), path = %path.display(), "loaded pinned certificates");
    Ok(certs)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
