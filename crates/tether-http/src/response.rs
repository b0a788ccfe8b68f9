//! HTTP response types.

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use reqwest::header::HeaderMap;
use std::fmt;

use crate::client::HttpError;
use crate::request::ResponseType;

/// Response body, decoded according to the request's [`ResponseType`].
pub enum ResponseBody {
    /// `json`
    Json(serde_json::Value),
    /// `text` and `document`
    Text(String),
    /// `arraybuffer` and `blob`
    Bytes(Bytes),
    /// `stream`: the body is not read up front.
    Stream(BoxStream<'static, Result<Bytes, reqwest::Error>>),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Json(v) => f.debug_tuple("Json").field(v).finish(),
            ResponseBody::Text(s) => f.debug_tuple("Text").field(s).finish(),
            ResponseBody::Bytes(b) => f.debug_tuple("Bytes").field(b).finish(),
            ResponseBody::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Response returned by [`HttpClient`](crate::HttpClient).
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: ResponseBody,
}

impl HttpResponse {
    /// Read a successful reqwest response into the shape `response_type` asks for.
    ///
    /// An empty body read as JSON (204, 205, or zero bytes) becomes `Value::Null`.
    pub async fn read(
        response: reqwest::Response,
        response_type: ResponseType,
    ) -> Result<Self, HttpError> {
        let status = response.status().as_u16();
        let headers = response.headers().clone();

        let body = match response_type {
            ResponseType::Json => {
                let bytes = response.bytes().await.map_err(HttpError::from)?;
                if matches!(status, 204 | 205) || bytes.is_empty() {
                    return Ok(Self {
                        status,
                        headers,
                        body: ResponseBody::Json(serde_json::Value::Null),
                    });
                }
                let value = serde_json::from_slice(&bytes).map_err(|e| HttpError::Decode {
                    status,
                    body: String::from_utf8_lossy(&bytes).to_string(),
                    source: e,
                })?;
                ResponseBody::Json(value)
            }
            ResponseType::Text | ResponseType::Document => {
                ResponseBody::Text(response.text().await.map_err(HttpError::from)?)
            }
            ResponseType::ArrayBuffer | ResponseType::Blob => {
                ResponseBody::Bytes(response.bytes().await.map_err(HttpError::from)?)
            }
            ResponseType::Stream => ResponseBody::Stream(stream_response(response).boxed()),
        };

        Ok(Self { status, headers, body })
    }

    /// The JSON body, if the response was read as JSON.
    pub fn json(&self) -> Option<&serde_json::Value> {
        match &self.body {
            ResponseBody::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Deserialize a JSON body into `T`.
    pub fn parse_json<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Option<Result<T, serde_json::Error>> {
        self.json().map(|v| T::deserialize(v))
    }

    /// The text body, if the response was read as text or document.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The raw body, if the response was read as arraybuffer or blob.
    pub fn bytes(&self) -> Option<&Bytes> {
        match &self.body {
            ResponseBody::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Take the body stream, if the response was requested as a stream.
    pub fn into_stream(self) -> Option<BoxStream<'static, Result<Bytes, reqwest::Error>>> {
        match self.body {
            ResponseBody::Stream(s) => Some(s),
            _ => None,
        }
    }
}

/// Stream response content.
pub fn stream_response(
    response: reqwest::Response,
) -> impl Stream<Item = Result<Bytes, reqwest::Error>> {
    response.bytes_stream()
}
