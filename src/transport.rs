//! Authenticated HTTP transport with timeout and multipart support.
//!
//! One logical operation per HTTP verb. All failures (non-2xx status,
//! network fault, timeout) normalize into [RequestError]. Calls are
//! independent and may be issued concurrently on the same [Transport];
//! the only shared state is the immutable credentials and timeout default.

use crate::collection::{Collection, Template};
use crate::constants::{ACCEPT_MIME, COLLECTION_JSON_MIME, DEFAULT_TIMEOUT};
use crate::errors::{ConfigError, ProtocolError, RequestError};
use crate::types::Username;
use bytes::Bytes;
use camino::Utf8Path;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

/// Flat scalar search parameters, e.g. exact/substring filters, the
/// `min_*`/`max_*` range conventions, and `limit`/`offset` pagination.
/// `null` values are dropped before encoding.
pub type SearchParams = Map<String, Value>;

/// How the client authenticates with the API. Immutable once a
/// [Transport] is constructed.
#[derive(Clone)]
pub enum Credentials {
    Basic { username: Username, password: String },
    Token(String),
}

// Secrets must never appear in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", &username.as_str())
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
        }
    }
}

/// The single binary part of a multipart write request.
#[derive(Debug, Clone)]
pub struct FileBlob {
    pub filename: String,
    pub content: Bytes,
}

impl FileBlob {
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Read a local file into a blob, named after its final path component.
    pub async fn from_path(path: impl AsRef<Utf8Path>) -> Result<Self, std::io::Error> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("\"{}\" has no file name", path),
                )
            })?
            .to_string();
        let content = fs_err::tokio::read(path).await?;
        Ok(Self {
            filename,
            content: content.into(),
        })
    }
}

/// A successful response: raw status plus the body, with decoders for
/// the Collection+JSON envelope and for plain JSON.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    /// Decode the body as a Collection+JSON envelope.
    pub fn collection(&self) -> Result<Collection, ProtocolError> {
        Collection::decode(&self.body)
    }

    /// Decode the body as plain JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_str(&self.body).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

/// Issues authenticated requests. Cheap to clone; clones share the
/// underlying connection pool.
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    credentials: Credentials,
    timeout: Duration,
}

impl Transport {
    pub fn new(credentials: Credentials) -> Result<Self, ConfigError> {
        Self::with_timeout(credentials, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(credentials: Credentials, timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::ClientBuilder::new()
            .default_headers(accept_headers())
            .build()?;
        Ok(Self {
            client,
            credentials,
            timeout,
        })
    }

    /// `GET url` with URL-encoded query parameters. Never retried:
    /// failure surfaces immediately.
    pub async fn get(
        &self,
        url: &str,
        search: Option<&SearchParams>,
        timeout: Option<Duration>,
    ) -> Result<ApiResponse, RequestError> {
        let mut builder = self.client.get(url);
        if let Some(params) = search {
            let params: SearchParams = params
                .iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect();
            if !params.is_empty() {
                builder = builder.query(&params);
            }
        }
        self.send("GET", url, builder, timeout).await
    }

    /// `POST url` with a Collection+JSON template body built from `data`,
    /// or a multipart body when `blob` is supplied (the `data` fields as
    /// text parts alongside the one binary part, named `fname`).
    pub async fn post(
        &self,
        url: &str,
        data: &Map<String, Value>,
        blob: Option<FileBlob>,
        timeout: Option<Duration>,
    ) -> Result<ApiResponse, RequestError> {
        let builder = match blob {
            Some(blob) => self.client.post(url).multipart(multipart_form(data, blob)),
            None => self
                .client
                .post(url)
                .header(CONTENT_TYPE, COLLECTION_JSON_MIME)
                .body(template_body(data)),
        };
        self.send("POST", url, builder, timeout).await
    }

    /// `POST url` with a plain-JSON body, for the endpoints outside the
    /// Collection+JSON surface (auth-token issuance, account creation).
    pub async fn post_json<T: Serialize>(
        &self,
        url: &str,
        payload: &T,
        timeout: Option<Duration>,
    ) -> Result<ApiResponse, RequestError> {
        let body =
            serde_json::to_string(payload).map_err(|e| RequestError::encoding("POST", url, e))?;
        let builder = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        self.send("POST", url, builder, timeout).await
    }

    /// `PUT url` with a Collection+JSON template body built from `data`.
    pub async fn put(
        &self,
        url: &str,
        data: &Map<String, Value>,
        timeout: Option<Duration>,
    ) -> Result<ApiResponse, RequestError> {
        let builder = self
            .client
            .put(url)
            .header(CONTENT_TYPE, COLLECTION_JSON_MIME)
            .body(template_body(data));
        self.send("PUT", url, builder, timeout).await
    }

    /// `DELETE url`. No body.
    pub async fn delete(
        &self,
        url: &str,
        timeout: Option<Duration>,
    ) -> Result<ApiResponse, RequestError> {
        let builder = self.client.delete(url);
        self.send("DELETE", url, builder, timeout).await
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Credentials::Basic { username, password } => {
                builder.basic_auth(username.as_str(), Some(password))
            }
            Credentials::Token(token) => {
                builder.header(AUTHORIZATION, format!("token {}", token))
            }
        }
    }

    async fn send(
        &self,
        method: &'static str,
        url: &str,
        builder: reqwest::RequestBuilder,
        timeout: Option<Duration>,
    ) -> Result<ApiResponse, RequestError> {
        let builder = self
            .authorize(builder)
            .timeout(timeout.unwrap_or(self.timeout));
        let res = builder
            .send()
            .await
            .map_err(|e| RequestError::transport(method, url, e))?;
        check(method, url, res).await
    }
}

/// Normalize a response: 2xx passes through, anything else becomes a
/// [RequestError] carrying the status and body.
pub(crate) async fn check(
    method: &'static str,
    url: &str,
    res: reqwest::Response,
) -> Result<ApiResponse, RequestError> {
    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| RequestError::transport(method, url, e))?;
    if status.is_success() {
        Ok(ApiResponse { status, body })
    } else {
        Err(RequestError::status(method, url, status, body))
    }
}

fn accept_headers() -> HeaderMap {
    HeaderMap::from_iter([(ACCEPT, ACCEPT_MIME.parse().unwrap())])
}

fn template_body(data: &Map<String, Value>) -> String {
    serde_json::json!({ "template": Template::from_map(data) }).to_string()
}

fn multipart_form(data: &Map<String, Value>, blob: FileBlob) -> Form {
    let mut form = Form::new();
    for (name, value) in data {
        if value.is_null() {
            continue;
        }
        form = form.text(name.clone(), text_value(value));
    }
    form.part(
        "fname",
        Part::bytes(blob.content.to_vec()).file_name(blob.filename),
    )
}

/// Multipart text fields are sent bare for strings, JSON-encoded otherwise.
fn text_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use serde_json::json;

    #[rstest]
    #[case(json!("hello"), "hello")]
    #[case(json!(42), "42")]
    #[case(json!(true), "true")]
    fn test_text_value(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(text_value(&value), expected);
    }

    #[test]
    fn test_template_body() {
        let mut data = Map::new();
        data.insert("title".to_string(), json!("T"));
        data.insert("skipped".to_string(), Value::Null);
        assert_eq!(
            template_body(&data),
            r#"{"template":{"data":[{"name":"title","value":"T"}]}}"#
        );
    }

    #[tokio::test]
    async fn test_file_blob_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hi").unwrap();
        let path = camino::Utf8PathBuf::try_from(path).unwrap();
        let blob = FileBlob::from_path(&path).await.unwrap();
        assert_eq!(blob.filename, "hello.txt");
        assert_eq!(blob.content.as_ref(), b"hi");
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let basic = Credentials::Basic {
            username: Username::from("alice"),
            password: "hunter2".to_string(),
        };
        let token = Credentials::Token("sekrit".to_string());
        let printed = format!("{:?} {:?}", basic, token);
        assert!(printed.contains("alice"));
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("sekrit"));
    }
}
