//! Errors raised by generated clients at request time.

use thiserror::Error;

/// Result type for generated client calls
pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The response status matched no declared pattern and there is no `default`.
    /// `body` is the response body exactly as received.
    #[error("unhandled status code {status}; body: {}", String::from_utf8_lossy(body))]
    UnhandledStatusCode { status: u16, body: Vec<u8> },

    /// The response body did not match the declared type
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// A request value could not be encoded for its location
    #[error("failed to encode request: {0}")]
    Encode(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The transport failed before a response arrived
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ClientError {
    pub fn encode<S: Into<String>>(msg: S) -> Self {
        Self::Encode(msg.into())
    }

    /// Status code of an unhandled response, if that is what this is
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnhandledStatusCode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw body of an unhandled response
    pub fn body(&self) -> Option<&[u8]> {
        match self {
            Self::UnhandledStatusCode { body, .. } => Some(body.as_slice()),
            _ => None,
        }
    }
}
