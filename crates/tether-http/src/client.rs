//! Default reqwest-backed transport.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

use crate::request::{headers, Body, RequestDescriptor};
use crate::response::HttpResponse;
use crate::transport::Transport;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Maximum idle connections kept per host.
    pub pool_max_idle_per_host: usize,
    /// Enable gzip decompression.
    pub gzip: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: format!("tether/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 10,
            gzip: true,
        }
    }
}

impl HttpConfig {
    /// Defaults overridden by `TETHER_HTTP_*` environment variables.
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secs) = env_parse::<u64>("TETHER_HTTP_CONNECT_TIMEOUT") {
            config.connect_timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = env_parse::<u64>("TETHER_HTTP_TIMEOUT") {
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Ok(agent) = std::env::var("TETHER_HTTP_USER_AGENT") {
            if !agent.is_empty() {
                config.user_agent = agent;
            }
        }

        if let Some(max) = env_parse::<usize>("TETHER_HTTP_POOL_MAX_IDLE") {
            config.pool_max_idle_per_host = max;
        }

        if let Ok(gzip) = std::env::var("TETHER_HTTP_GZIP") {
            config.gzip = gzip.to_lowercase() == "true" || gzip == "1";
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Build a configured reqwest client.
pub fn build_client(config: HttpConfig) -> Result<Client, HttpError> {
    let mut builder = ClientBuilder::new()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .pool_max_idle_per_host(config.pool_max_idle_per_host);

    if config.gzip {
        builder = builder.gzip(true);
    }

    builder.build().map_err(HttpError::ClientBuild)
}

/// HTTP errors.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("server error: {status}")]
    ServerError { status: u16, body: String },

    #[error("client error: {status}")]
    ClientError { status: u16, body: String },

    #[error("invalid header `{name}`")]
    InvalidHeader { name: String },

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode response body (status {status}): {source}")]
    Decode {
        status: u16,
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<reqwest::Error> for HttpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            HttpError::Timeout
        } else {
            HttpError::Request(e)
        }
    }
}

/// reqwest-backed [`Transport`].
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    /// Create a new HTTP client with default config.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(HttpConfig::default())
    }

    /// Create a new HTTP client with custom config.
    pub fn with_config(config: HttpConfig) -> Result<Self, HttpError> {
        let inner = build_client(config)?;
        Ok(Self { inner })
    }

    /// Wrap an existing reqwest client.
    pub fn from_client(inner: Client) -> Self {
        Self { inner }
    }

    /// Get the inner reqwest client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Check response status and convert errors.
    pub async fn check_response(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, HttpError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);

            return Err(HttpError::RateLimited { retry_after });
        }

        let body = response.text().await.unwrap_or_default();

        if status.is_server_error() {
            Err(HttpError::ServerError {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(HttpError::ClientError {
                status: status.as_u16(),
                body,
            })
        }
    }

    fn build_request(
        &self,
        request: &RequestDescriptor,
    ) -> Result<reqwest::RequestBuilder, HttpError> {
        let mut header_map = HeaderMap::with_capacity(request.headers.len() + 1);
        for (name, value) in &request.headers {
            let invalid = || HttpError::InvalidHeader { name: name.clone() };
            let name = HeaderName::try_from(name.as_str()).map_err(|_| invalid())?;
            let value = HeaderValue::try_from(value.as_str()).map_err(|_| invalid())?;
            header_map.insert(name, value);
        }

        let mut builder = self.inner.request(request.method.into(), &request.url);
        if !request.query_parameters.is_empty() {
            builder = builder.query(&request.query_parameters);
        }

        if let Some(body) = &request.body {
            let content_type = match body {
                Body::Json(_) => headers::CONTENT_TYPE_JSON,
                Body::Text(_) => headers::CONTENT_TYPE_TEXT,
                Body::Bytes(_) => headers::CONTENT_TYPE_OCTET_STREAM,
            };
            if !header_map.contains_key(CONTENT_TYPE) {
                header_map.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
            builder = match body {
                Body::Json(value) => {
                    builder.body(serde_json::to_vec(value).map_err(HttpError::Encode)?)
                }
                Body::Text(text) => builder.body(text.clone()),
                Body::Bytes(bytes) => builder.body(bytes.clone()),
            };
        }

        Ok(builder.headers(header_map))
    }
}

#[async_trait]
impl Transport for HttpClient {
    type Response = HttpResponse;
    type Error = HttpError;

    async fn send(&self, request: RequestDescriptor) -> Result<HttpResponse, HttpError> {
        tracing::debug!("Making {} request to: {}", request.method, request.url);
        let response = self
            .build_request(&request)?
            .send()
            .await
            .map_err(HttpError::from)?;
        tracing::debug!("{} response: {} {}", request.method, response.status(), request.url);

        let response = Self::check_response(response).await?;
        HttpResponse::read(response, request.response_type).await
    }
}
