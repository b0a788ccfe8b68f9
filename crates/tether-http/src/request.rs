//! Request builder and the descriptor it hands to a transport.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{InvalidArgument, RequestError};
use crate::method::Method;
use crate::transport::Transport;

/// Common HTTP headers.
pub mod headers {
    pub const AUTHORIZATION: &str = "Authorization";
    pub const CONTENT_TYPE_JSON: &str = "application/json";
    pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";
    pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(serde_json::Value),
    Text(String),
    Bytes(Bytes),
}

impl Body {
    /// Serialize any value into a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Body::Json)
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(Bytes::from(bytes))
    }
}

/// A query parameter value: a string or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Integer(n) => write!(f, "{}", n),
            QueryValue::Float(n) => write!(f, "{}", n),
            QueryValue::Text(s) => f.write_str(s),
        }
    }
}

macro_rules! query_value_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for QueryValue {
            fn from(n: $t) -> Self {
                QueryValue::Integer(i64::from(n))
            }
        })*
    };
}

query_value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for QueryValue {
    fn from(n: f32) -> Self {
        QueryValue::Float(f64::from(n))
    }
}

impl From<f64> for QueryValue {
    fn from(n: f64) -> Self {
        QueryValue::Float(n)
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        QueryValue::Text(s)
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        QueryValue::Text(s.to_string())
    }
}

/// How the transport should interpret the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    ArrayBuffer,
    Blob,
    Document,
    #[default]
    Json,
    Text,
    Stream,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::ArrayBuffer => "arraybuffer",
            ResponseType::Blob => "blob",
            ResponseType::Document => "document",
            ResponseType::Json => "json",
            ResponseType::Text => "text",
            ResponseType::Stream => "stream",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arraybuffer" => Ok(ResponseType::ArrayBuffer),
            "blob" => Ok(ResponseType::Blob),
            "document" => Ok(ResponseType::Document),
            "json" => Ok(ResponseType::Json),
            "text" => Ok(ResponseType::Text),
            "stream" => Ok(ResponseType::Stream),
            _ => Err(InvalidArgument {
                argument: "response type",
                value: s.to_string(),
                expected: "arraybuffer, blob, document, json, text, stream",
            }),
        }
    }
}

/// Everything a transport needs to perform one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    /// Only populated for methods that carry a body.
    pub body: Option<Body>,
    pub query_parameters: BTreeMap<String, QueryValue>,
    pub response_type: ResponseType,
}

/// Fluent request builder.
///
/// Setters consume and return the builder. [`execute`](Self::execute) only
/// borrows it, so the same configuration can be sent again or adjusted and
/// sent again. Every field is last-write-wins and independent of the others.
#[derive(Debug, Clone)]
pub struct RequestBuilder<T> {
    transport: T,
    method: Method,
    base_url: String,
    resource_path: String,
    headers: BTreeMap<String, String>,
    body: Option<Body>,
    query_parameters: BTreeMap<String, QueryValue>,
    response_type: ResponseType,
}

impl<T: Transport> RequestBuilder<T> {
    /// Create a builder for `base_url`, sending through `transport`.
    ///
    /// A non-empty `token` is installed as a bearer `Authorization` header.
    pub fn new(transport: T, base_url: impl Into<String>, token: Option<&str>) -> Self {
        let builder = Self {
            transport,
            method: Method::default(),
            base_url: base_url.into(),
            resource_path: String::new(),
            headers: BTreeMap::new(),
            body: None,
            query_parameters: BTreeMap::new(),
            response_type: ResponseType::default(),
        };

        match token {
            Some(token) if !token.is_empty() => builder.set_token(token),
            _ => builder,
        }
    }

    pub fn as_get(mut self) -> Self {
        self.method = Method::Get;
        self
    }

    /// Switch to POST; `body` replaces any previous body, `None` included.
    pub fn as_post(mut self, body: impl Into<Option<Body>>) -> Self {
        self.method = Method::Post;
        self.body = body.into();
        self
    }

    /// Switch to PUT; `body` replaces any previous body, `None` included.
    pub fn as_put(mut self, body: impl Into<Option<Body>>) -> Self {
        self.method = Method::Put;
        self.body = body.into();
        self
    }

    pub fn as_delete(mut self) -> Self {
        self.method = Method::Delete;
        self
    }

    /// Switch to PATCH; `body` replaces any previous body, `None` included.
    pub fn as_patch(mut self, body: impl Into<Option<Body>>) -> Self {
        self.method = Method::Patch;
        self.body = body.into();
        self
    }

    pub fn set_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Replace the path appended to the base URL. No separator is inserted.
    pub fn set_relative_path(mut self, path: impl Into<String>) -> Self {
        self.resource_path = path.into();
        self
    }

    /// Replace the whole query parameter map.
    pub fn set_query_parameters<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<QueryValue>,
    {
        self.query_parameters = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Set `Authorization: Bearer <token>`, leaving other headers alone.
    pub fn set_token(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.set_header(headers::AUTHORIZATION, value)
    }

    pub fn set_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// Insert or overwrite a single header.
    ///
    /// Names compare case-insensitively: an existing entry spelled differently
    /// is replaced, and the new spelling is kept.
    pub fn set_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn relative_path(&self) -> &str {
        &self.resource_path
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// The stored body, regardless of the current method.
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    pub fn query_parameters(&self) -> &BTreeMap<String, QueryValue> {
        &self.query_parameters
    }

    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }

    /// Base URL and path, concatenated as-is.
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.resource_path)
    }

    /// Validate and snapshot the current configuration.
    pub fn descriptor(&self) -> Result<RequestDescriptor, RequestError<T::Error>> {
        if self.base_url.is_empty() {
            return Err(RequestError::MissingConfiguration {
                field: "base_url",
                setter: "set_base_url",
            });
        }

        let body = if self.method.carries_body() {
            self.body.clone()
        } else {
            None
        };

        Ok(RequestDescriptor {
            method: self.method,
            url: self.url(),
            headers: self.headers.clone(),
            body,
            query_parameters: self.query_parameters.clone(),
            response_type: self.response_type,
        })
    }

    /// Send one request with the current configuration.
    ///
    /// Fails with [`RequestError::MissingConfiguration`] without touching the
    /// transport when the base URL is empty. Otherwise the transport's
    /// response or error is returned unchanged.
    pub async fn execute(&self) -> Result<T::Response, RequestError<T::Error>> {
        let request = match self.descriptor() {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "refusing to execute request");
                return Err(e);
            }
        };

        let span = tether_log::spans::request_span(request.method.as_str(), &request.url);
        let send = async move {
            tracing::debug!(response_type = %request.response_type, "dispatching request");
            match self.transport.send(request).await {
                Ok(response) => Ok(response),
                Err(e) => {
                    tether_log::spans::record_error(&e);
                    Err(RequestError::Transport(e))
                }
            }
        };
        tether_log::spans::instrument_future(send, span).await
    }
}
