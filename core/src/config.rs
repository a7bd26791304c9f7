//! Client configuration.
//!
//! # Design
//! `ClientConfig` is a plain value: the base URL, the optional credentials
//! and the TLS settings that every request built from it shares. It is
//! assembled once through `ClientConfigBuilder` (or `from_env`) and later
//! adjusted only through `&mut` setters, so a request in flight always sees
//! one consistent configuration.
//!
//! URL rule: the stored base URL never ends with `/`. Endpoints are joined
//! with exactly one slash at request time (see `join_url`).

use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::ApiError;
use crate::http::{Credentials, TlsMode};

/// Scheme used by `set_token` when the caller does not name one.
pub const DEFAULT_TOKEN_SCHEME: &str = "BASIC";

/// An `Authorization` token: upper-cased scheme plus opaque value.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    scheme: String,
    value: String,
}

impl Token {
    pub fn new(value: impl Into<String>, scheme: &str) -> Self {
        Self {
            scheme: scheme.to_uppercase(),
            value: value.into(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The full header value, `"<SCHEME> <value>"`.
    pub fn header_value(&self) -> String {
        format!("{} {}", self.scheme, self.value)
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("scheme", &self.scheme)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Everything a `RequestClient` needs to build requests.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    base_url: String,
    certificate_path: Option<PathBuf>,
    token: Option<Token>,
    credentials: Option<Credentials>,
    accept_invalid_certs: bool,
    detect_error_field: bool,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            ..Self::default()
        }
    }

    pub fn builder(base_url: &str) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::new(base_url),
        }
    }

    /// Build a configuration from `API_*` environment variables.
    ///
    /// `API_BASE_URL` is required. `API_TOKEN` (with optional
    /// `API_TOKEN_SCHEME`), `API_USERNAME`/`API_PASSWORD`, `API_CA_CERT`,
    /// `API_ACCEPT_INVALID_CERTS` and `API_DETECT_ERROR_FIELD` are optional.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("API_BASE_URL")
            .ok_or_else(|| ApiError::Configuration("API_BASE_URL is not set".to_string()))?;
        let mut config = Self::new(&base_url);

        if let Some(token) = lookup("API_TOKEN") {
            let scheme = lookup("API_TOKEN_SCHEME");
            config.set_token(Some(token.as_str()), scheme.as_deref().unwrap_or(DEFAULT_TOKEN_SCHEME));
        }
        match (lookup("API_USERNAME"), lookup("API_PASSWORD")) {
            (Some(username), password) => {
                config.set_credentials(&username, password.as_deref().unwrap_or_default());
            }
            (None, Some(_)) => {
                return Err(ApiError::Configuration(
                    "API_PASSWORD is set without API_USERNAME".to_string(),
                ))
            }
            (None, None) => {}
        }
        config.set_certificate_path(lookup("API_CA_CERT"))?;
        config.accept_invalid_certs = lookup("API_ACCEPT_INVALID_CERTS")
            .map(|v| parse_flag("API_ACCEPT_INVALID_CERTS", &v))
            .transpose()?
            .unwrap_or(false);
        config.detect_error_field = lookup("API_DETECT_ERROR_FIELD")
            .map(|v| parse_flag("API_DETECT_ERROR_FIELD", &v))
            .transpose()?
            .unwrap_or(false);
        Ok(config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn certificate_path(&self) -> Option<&Path> {
        self.certificate_path.as_deref()
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    pub fn detect_error_field(&self) -> bool {
        self.detect_error_field
    }

    pub fn set_base_url(&mut self, url: &str) -> &mut Self {
        self.base_url = normalize_base_url(url);
        self
    }

    /// Pin TLS verification to the certificate at `path`, or clear the pin
    /// with `None`.
    ///
    /// The file must exist and be readable now; it is read again when a
    /// request is sent.
    pub fn set_certificate_path<P: AsRef<Path>>(
        &mut self,
        path: Option<P>,
    ) -> Result<&mut Self, ApiError> {
        self.certificate_path = match path {
            Some(path) => Some(validate_certificate_path(path.as_ref())?),
            None => None,
        };
        Ok(self)
    }

    /// Set basic-auth credentials, sent by the transport as
    /// `Authorization: Basic base64(user:password)`.
    ///
    /// Both a token and credentials may be configured, but the transport
    /// only adds the basic header when no `Authorization` header is already
    /// on the request. A configured token, or a caller-supplied
    /// `Authorization` header, therefore takes precedence (curl behaves the
    /// same way).
    pub fn set_credentials(&mut self, username: &str, password: &str) -> &mut Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    pub fn clear_credentials(&mut self) -> &mut Self {
        self.credentials = None;
        self
    }

    /// Set the `Authorization` token. `None` clears a previously set token.
    pub fn set_token(&mut self, value: Option<&str>, scheme: &str) -> &mut Self {
        self.token = value.map(|v| Token::new(v, scheme));
        self
    }

    /// Opt out of TLS verification when no certificate is pinned.
    pub fn set_accept_invalid_certs(&mut self, accept: bool) -> &mut Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Treat a response object with an `error` key as a failure.
    pub fn set_detect_error_field(&mut self, detect: bool) -> &mut Self {
        self.detect_error_field = detect;
        self
    }

    /// TLS mode for requests built from this configuration.
    pub fn tls_mode(&self) -> TlsMode {
        match (&self.certificate_path, self.accept_invalid_certs) {
            (Some(path), _) => TlsMode::Pinned(path.clone()),
            (None, true) => TlsMode::Disabled,
            (None, false) => TlsMode::Verify,
        }
    }

    /// Join the base URL and `endpoint` with exactly one `/`.
    ///
    /// An empty endpoint yields the base URL itself.
    pub fn join_url(&self, endpoint: &str) -> String {
        if endpoint.is_empty() {
            self.base_url.clone()
        } else if endpoint.starts_with('/') {
            format!("{}{endpoint}", self.base_url)
        } else {
            format!("{}/{endpoint}", self.base_url)
        }
    }
}

/// Fluent construction of a `ClientConfig`.
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn certificate_path<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ApiError> {
        self.config.set_certificate_path(Some(path))?;
        Ok(self)
    }

    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.config.set_credentials(username, password);
        self
    }

    pub fn token(mut self, value: &str, scheme: &str) -> Self {
        self.config.set_token(Some(value), scheme);
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.config.accept_invalid_certs = accept;
        self
    }

    pub fn detect_error_field(mut self, detect: bool) -> Self {
        self.config.detect_error_field = detect;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

fn validate_certificate_path(path: &Path) -> Result<PathBuf, ApiError> {
    if !path.is_file() {
        return Err(ApiError::Configuration(format!(
            "certificate path {} does not exist or is not a file",
            path.display()
        )));
    }
    File::open(path).map_err(|e| {
        ApiError::Configuration(format!(
            "certificate path {} is not readable: {e}",
            path.display()
        ))
    })?;
    Ok(path.to_path_buf())
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ApiError::Configuration(format!(
            "{key} must be a boolean, got {other:?}"
        ))),
    }
}
