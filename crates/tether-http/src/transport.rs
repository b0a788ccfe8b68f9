//! The transport seam.

use async_trait::async_trait;
use std::sync::Arc;

use crate::request::RequestDescriptor;

/// Something that can perform one HTTP request.
///
/// The builder never inspects the response or the error; both are returned
/// to the caller exactly as the transport produced them.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Value produced for a completed request.
    type Response: Send;
    /// Transport-level failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Perform the request described by `request`.
    async fn send(&self, request: RequestDescriptor) -> Result<Self::Response, Self::Error>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for &T {
    type Response = T::Response;
    type Error = T::Error;

    async fn send(&self, request: RequestDescriptor) -> Result<Self::Response, Self::Error> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    type Response = T::Response;
    type Error = T::Error;

    async fn send(&self, request: RequestDescriptor) -> Result<Self::Response, Self::Error> {
        (**self).send(request).await
    }
}
