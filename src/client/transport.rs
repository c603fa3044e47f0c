use super::error::ClientError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use url::Url;

pub use reqwest::Method;

/// Mutating requests get the longer timeout.
pub fn is_mutating(method: &Method) -> bool {
    *method != Method::GET
}

#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keeps credentials out of debug logs.
impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"**REDACTED**")
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub body: Option<Value>,
    pub timeout: Duration,
    pub auth: Option<BasicAuth>,
}

impl Request {
    /// Path relative to the `/api/` base, e.g. `devices/wled/effects`.
    pub fn api_path(&self) -> &str {
        let path = self.url.path();
        path.strip_prefix("/api/").unwrap_or(path)
    }
}

/// Carries one request to the server and hands back the raw response body.
///
/// Implementations map every transport-level failure to
/// [`ClientError::Connection`]; interpreting the body is left to the client.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn send(&self, request: Request) -> Result<String, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::Connection(e.to_string()))?;
        Ok(Self { http })
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<String, ClientError> {
        let mut builder = self
            .http
            .request(request.method, request.url)
            .timeout(request.timeout);

        if let Some(auth) = &request.auth {
            builder = builder.basic_auth(&auth.username, Some(&auth.password));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        response
            .text()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))
    }
}
