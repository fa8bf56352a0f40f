//! HTTP transport module
//!
//! This module issues requests against the REST authority:
//! - bounded request timeout with abort on expiry
//! - bearer credential attachment from an injected provider
//! - success/error classification of responses
//! - JSON and multipart request bodies
//!
//! The [`Api`] trait is the capability surface the resource clients build
//! on; the production [`Transport`] and test doubles implement the same
//! interface.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ApiConfig, CredentialProvider};
use crate::{Error, Result};

/// Capability interface over the REST authority.
///
/// Every method resolves to the `data` payload of the response envelope
/// `{success, data, message?}` or a classified [`Error`]. Implementations
/// are stateless per call and never mutate store state.
pub trait Api: Clone + Send + Sync + 'static {
    /// Issue a GET request
    fn get(&self, path: &str) -> impl Future<Output = Result<Value>> + Send;

    /// Issue a POST request with an optional JSON body
    fn post_json(&self, path: &str, body: Option<Value>)
    -> impl Future<Output = Result<Value>> + Send;

    /// Issue a PATCH request with a JSON body
    fn patch_json(&self, path: &str, body: Value) -> impl Future<Output = Result<Value>> + Send;

    /// Issue a POST request with a multipart form body
    fn upload(&self, path: &str, form: MultipartForm)
    -> impl Future<Output = Result<Value>> + Send;
}

/// One file entry of a multipart form
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    /// Original filename
    pub filename: String,
    /// MIME type of the content
    pub content_type: String,
    /// File bytes
    pub data: Bytes,
}

impl FilePart {
    /// Create a file part
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

/// Transport-agnostic multipart form description.
///
/// Entries keep insertion order: business fields are added first, then one
/// form entry per file. The transport sets the multipart boundary itself;
/// callers never supply a `Content-Type` header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    fields: Vec<(String, String)>,
    files: Vec<(String, FilePart)>,
}

impl MultipartForm {
    /// Create an empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Append a file under the given field name
    pub fn file(mut self, field: impl Into<String>, part: FilePart) -> Self {
        self.files.push((field.into(), part));
        self
    }

    /// Text fields in insertion order
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// File entries in insertion order
    pub fn files(&self) -> &[(String, FilePart)] {
        &self.files
    }
}

/// Success envelope wrapping every authority response
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Value,
    message: Option<String>,
}

/// Structured error body the authority emits on failures
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    code: Option<String>,
}

/// HTTP transport over the REST authority
///
/// # Example
/// ```rust,no_run
/// use mercado_sync::config::{ApiConfig, StaticCredentials};
/// use mercado_sync::transport::Transport;
///
/// # fn main() -> mercado_sync::Result<()> {
/// let transport = Transport::new(
///     ApiConfig::default(),
///     StaticCredentials::new(Some("token".to_string())),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Transport {
    client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl Transport {
    /// Create a transport with the given configuration and credential source.
    ///
    /// The request timeout from the configuration applies to every call and
    /// aborts the in-flight request on expiry.
    pub fn new(config: ApiConfig, credentials: impl CredentialProvider + 'static) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url,
            credentials: Arc::new(credentials),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.credentials.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, path);

        let mut request = self.authorize(self.client.request(method, &url));
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(classify_reqwest_error)?;
        handle_response(response).await
    }
}

impl Api for Transport {
    async fn get(&self, path: &str) -> Result<Value> {
        self.execute(Method::GET, path, None).await
    }

    async fn post_json(&self, path: &str, body: Option<Value>) -> Result<Value> {
        self.execute(Method::POST, path, body).await
    }

    async fn patch_json(&self, path: &str, body: Value) -> Result<Value> {
        self.execute(Method::PATCH, path, Some(body)).await
    }

    async fn upload(&self, path: &str, form: MultipartForm) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {} (multipart, {} files)", path, form.files().len());

        let request = self.authorize(self.client.post(&url));
        let response = request
            .multipart(into_reqwest_form(form)?)
            .send()
            .await
            .map_err(classify_reqwest_error)?;
        handle_response(response).await
    }
}

/// Convert the transport-agnostic form into a reqwest multipart body
fn into_reqwest_form(form: MultipartForm) -> Result<reqwest::multipart::Form> {
    let MultipartForm { fields, files } = form;

    let mut out = reqwest::multipart::Form::new();
    for (name, value) in fields {
        out = out.text(name, value);
    }
    for (field, part) in files {
        let file = reqwest::multipart::Part::bytes(part.data.to_vec())
            .file_name(part.filename)
            .mime_str(&part.content_type)
            .map_err(|e| Error::Validation(format!("invalid content type: {}", e)))?;
        out = out.part(field, file);
    }
    Ok(out)
}

/// Map a reqwest failure onto the crate error taxonomy
fn classify_reqwest_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Timeout
    } else if error.is_decode() {
        Error::Decode(error.to_string())
    } else {
        Error::Transport(error.to_string())
    }
}

async fn handle_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let reason = status.canonical_reason().unwrap_or("unknown error");
    let text = response.text().await.map_err(classify_reqwest_error)?;

    if !status.is_success() {
        let err = error_from_body(status.as_u16(), reason, &text);
        warn!("request failed: {}", err);
        return Err(err);
    }

    data_from_success_body(status.as_u16(), &text)
}

/// Build the error for a non-2xx response.
///
/// Prefers the structured body `{success:false, error, code?}`; falls back
/// to a synthesized `HTTP <status>: <reason>` message. The numeric status is
/// always carried.
fn error_from_body(status: u16, reason: &str, body: &str) -> Error {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => Error::Http {
            status,
            message: parsed.error,
            code: parsed.code,
        },
        Err(_) => Error::Http {
            status,
            message: format!("HTTP {}: {}", status, reason),
            code: None,
        },
    }
}

/// Unwrap the success envelope of a 2xx response
fn data_from_success_body(status: u16, body: &str) -> Result<Value> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| Error::Decode(format!("invalid response envelope: {}", e)))?;

    if !envelope.success {
        return Err(Error::Http {
            status,
            message: envelope
                .message
                .unwrap_or_else(|| "request failed".to_string()),
            code: None,
        });
    }

    Ok(envelope.data)
}
