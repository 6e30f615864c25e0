//! Errors for this crate.

use reqwest::StatusCode;
use serde_json::Value;

#[derive(thiserror::Error, Debug)]
pub enum InvalidApiUrl {
    #[error("Given URL does not end with \"/api/v1/\": {0}")]
    EndpointVersion(String),

    #[error("Given URL does not start with \"http://\" or \"https://\": {0}")]
    Protocol(String),
}

aliri_braid::from_infallible!(InvalidApiUrl);

/// Errors from client construction. These are surfaced synchronously,
/// before any request is made, and are never retried.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("No credentials were supplied")]
    MissingCredentials,

    #[error(transparent)]
    Url(#[from] InvalidApiUrl),

    /// The underlying HTTP client could not be constructed.
    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

/// The response violates the Collection+JSON contract. Indicates a
/// server/client version mismatch, so it is fatal for the call and
/// never retried.
#[derive(thiserror::Error, Debug)]
pub enum ProtocolError {
    /// The body is missing the `collection` wrapper or `version` field,
    /// or is otherwise not a Collection+JSON document.
    #[error("Response is not a Collection+JSON document: {0}")]
    Envelope(String),

    /// A plain-JSON body could not be decoded into the expected shape.
    #[error("Failed to decode response body: {0}")]
    Decode(String),

    /// A link relation required by the client is absent.
    #[error("Link relation \"{rel}\" is absent from {url}")]
    MissingLink { rel: String, url: String },

    /// A response which must contain at least one item contained none.
    #[error("Response from {0} contained no items")]
    NoItems(String),
}

/// A failed HTTP interaction: non-2xx status, network fault, or timeout.
///
/// Carries the outgoing request descriptor and, when a response was
/// received, its status and body. Callers distinguish cases by inspecting
/// these fields; there is no separate error per status code. The core
/// never retries; retry policy, if any, belongs to the caller.
#[derive(thiserror::Error, Debug)]
#[error("{method} {url} failed: {message}")]
pub struct RequestError {
    pub message: String,
    pub method: &'static str,
    pub url: String,
    pub status: Option<StatusCode>,
    pub body: Option<String>,
    #[source]
    source: Option<reqwest::Error>,
}

impl RequestError {
    /// The request never produced a response (connect fault, timeout, or
    /// the body could not be read).
    pub(crate) fn transport(method: &'static str, url: &str, source: reqwest::Error) -> Self {
        let message = if source.is_timeout() {
            "request timed out".to_string()
        } else {
            source.to_string()
        };
        Self {
            message,
            method,
            url: url.to_string(),
            status: None,
            body: None,
            source: Some(source),
        }
    }

    /// The server answered with a non-2xx status.
    pub(crate) fn status(method: &'static str, url: &str, status: StatusCode, body: String) -> Self {
        let reason = status.canonical_reason().unwrap_or("unknown reason");
        Self {
            message: format!("({} {})", status.as_u16(), reason),
            method,
            url: url.to_string(),
            status: Some(status),
            body: Some(body),
            source: None,
        }
    }

    /// A 2xx response whose body does not decode into the expected shape.
    pub(crate) fn malformed(
        method: &'static str,
        url: &str,
        status: StatusCode,
        body: String,
        message: String,
    ) -> Self {
        Self {
            message,
            method,
            url: url.to_string(),
            status: Some(status),
            body: Some(body),
            source: None,
        }
    }

    /// The outgoing body could not be encoded.
    pub(crate) fn encoding(method: &'static str, url: &str, error: serde_json::Error) -> Self {
        Self {
            message: format!("failed to encode request body: {}", error),
            method,
            url: url.to_string(),
            status: None,
            body: None,
            source: None,
        }
    }

    /// Whether this failure was caused by timeout expiry.
    pub fn is_timeout(&self) -> bool {
        self.source
            .as_ref()
            .map(reqwest::Error::is_timeout)
            .unwrap_or(false)
    }

    /// Field-keyed validation errors from the response body, surfaced
    /// verbatim. E.g. a duplicate-email rejection is keyed by `"email"`.
    pub fn field_errors(&self) -> Option<serde_json::Map<String, Value>> {
        let body = self.body.as_deref()?;
        match serde_json::from_str(body).ok()? {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }
}

/// Errors from resource operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors when trying to get a single object from a collection.
///
/// [GetError::NotFound] means the HTTP call itself succeeded but the
/// well-formed response simply lacks the requested item, which is
/// distinct from a transport failure.
#[derive(thiserror::Error, Debug)]
pub enum GetError {
    #[error("\"{0}\" not found")]
    NotFound(String),

    #[error(transparent)]
    Error(#[from] Error),
}

impl From<RequestError> for GetError {
    fn from(error: RequestError) -> Self {
        Error::from(error).into()
    }
}

impl From<ProtocolError> for GetError {
    fn from(error: ProtocolError) -> Self {
        Error::from(error).into()
    }
}
