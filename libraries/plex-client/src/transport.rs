//! HTTP transport seam between the client and the network.

use crate::error::{ErrorCode, PlexClientError, TransportError};
use crate::types::ClientConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use std::error::Error as StdError;
use std::io;
use tracing::debug;

/// Header carrying the auth token on every request.
pub const TOKEN_HEADER: &str = "X-Plex-Token";

/// A request relative to the server's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path starting with `/`
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Value of a query parameter, if present.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response from the server, any status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// 200 with a JSON body.
    pub fn json_body(value: &serde_json::Value) -> Self {
        Self::new(200, value.to_string())
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body. An empty body decodes as `{}`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        let body = if self.body.trim().is_empty() {
            "{}"
        } else {
            self.body.as_str()
        };
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))
    }

    /// The body as untyped JSON. An empty body is `null`.
    pub fn value(&self) -> Result<serde_json::Value, TransportError> {
        if self.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&self.body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// Sends one request and reports the outcome. Implementations must not retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Non-success statuses are returned as `Ok`; only failures to obtain a
    /// response are errors.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Transport backed by `reqwest`, with auth and accept headers preset.
pub struct ReqwestTransport {
    http: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Build the HTTP client. `config.url` must already be normalized.
    pub fn new(config: &ClientConfig) -> Result<Self, PlexClientError> {
        let mut token = HeaderValue::from_str(&config.token).map_err(|_| {
            PlexClientError::Config("Token contains characters not allowed in a header".into())
        })?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("x-plex-token"), token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .user_agent(format!(
                "plex-playlist-manager/{}",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| PlexClientError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.url.clone(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(method = %request.method, url = %url, "Request sent");

        let mut builder = self.http.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        let response = builder.send().await.map_err(classify)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(classify)?;

        debug!(status, url = %url, "Response received");

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

/// Map a reqwest failure to a transport error with the best known code.
fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect {
            code: connect_code(&err),
            message: err.to_string(),
        }
    } else if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}

/// Walk the source chain looking for the socket-level cause.
fn connect_code(err: &(dyn StdError + 'static)) -> Option<ErrorCode> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionRefused => return Some(ErrorCode::ConnectionRefused),
                io::ErrorKind::TimedOut => return Some(ErrorCode::TimedOut),
                _ => {}
            }
        }
        if is_dns_failure(&e.to_string()) {
            return Some(ErrorCode::HostNotFound);
        }
        current = e.source();
    }
    None
}

fn is_dns_failure(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("dns error")
        || message.contains("failed to lookup address")
        || message.contains("name or service not known")
        || message.contains("no such host")
}
