//! Span helpers for request tracing.

use std::future::Future;
use tracing::{field, info_span, Instrument, Span};

/// Span covering one outgoing HTTP request.
///
/// Declares an empty `error` field so [`record_error`] can fill it in.
pub fn request_span(method: &str, url: &str) -> Span {
    info_span!("http.request", method = %method, url = %url, error = field::Empty)
}

/// Instrument a future with a span.
pub fn instrument_future<F: Future>(future: F, span: Span) -> impl Future<Output = F::Output> {
    future.instrument(span)
}

/// Record an error on the current span.
pub fn record_error(error: &dyn std::error::Error) {
    Span::current().record("error", field::display(error));
}
