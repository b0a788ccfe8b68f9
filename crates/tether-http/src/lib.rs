//! Fluent HTTP request builder for Tether.
//!
//! A [`RequestBuilder`] accumulates method, path, headers, query parameters,
//! body and response type, then hands a [`RequestDescriptor`] to a
//! [`Transport`] when executed. [`HttpClient`] is the reqwest-backed default.

pub mod client;
pub mod error;
pub mod method;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{HttpClient, HttpConfig, HttpError, build_client};
pub use error::{InvalidArgument, RequestError};
pub use method::Method;
pub use request::{Body, QueryValue, RequestBuilder, RequestDescriptor, ResponseType, headers};
pub use response::{HttpResponse, ResponseBody};
pub use transport::Transport;
