//! Builder error types.

/// Errors returned by [`RequestBuilder::execute`](crate::RequestBuilder::execute).
///
/// `E` is the transport's own error type. Transport failures are carried
/// as-is: the variant is transparent, so `Display` and `source()` are the
/// transport error's own.
#[derive(Debug, thiserror::Error)]
pub enum RequestError<E> {
    #[error("missing required configuration `{field}`: call `{setter}` before executing")]
    MissingConfiguration {
        field: &'static str,
        setter: &'static str,
    },

    #[error(transparent)]
    Transport(E),
}

impl<E> RequestError<E> {
    /// Returns `true` if the request was rejected before reaching the transport.
    pub fn is_missing_configuration(&self) -> bool {
        matches!(self, RequestError::MissingConfiguration { .. })
    }

    /// Borrow the transport error, if any.
    pub fn transport(&self) -> Option<&E> {
        match self {
            RequestError::Transport(e) => Some(e),
            RequestError::MissingConfiguration { .. } => None,
        }
    }

    /// Take back the transport error value.
    pub fn into_transport(self) -> Option<E> {
        match self {
            RequestError::Transport(e) => Some(e),
            RequestError::MissingConfiguration { .. } => None,
        }
    }
}

/// A loosely typed value that did not name a supported variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {argument} `{value}` (expected one of: {expected})")]
pub struct InvalidArgument {
    pub argument: &'static str,
    pub value: String,
    pub expected: &'static str,
}
