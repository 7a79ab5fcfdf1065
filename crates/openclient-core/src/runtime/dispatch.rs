//! Per-operation response dispatch.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use super::error::{ClientError, ClientResult};
use super::status::StatusPattern;

type Handler<T> = Box<dyn FnOnce(&[u8]) -> ClientResult<T> + Send>;

/// One handler per declared status pattern, in declaration order.
///
/// Generated operations build a dispatcher with a handler for every
/// response they declare. Callers may replace any of them with
/// [`on`](Self::on) before the request is sent.
pub struct ResponseDispatcher<T> {
    handlers: Vec<(StatusPattern, Handler<T>)>,
}

impl<T> ResponseDispatcher<T> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Set the handler for `pattern`.
    ///
    /// A pattern that already has a handler keeps its position; a new one is
    /// appended after every existing pattern.
    pub fn on<F>(mut self, pattern: StatusPattern, handler: F) -> Self
    where
        F: FnOnce(&[u8]) -> ClientResult<T> + Send + 'static,
    {
        self.set(pattern, handler);
        self
    }

    /// In-place form of [`on`](Self::on)
    pub fn set<F>(&mut self, pattern: StatusPattern, handler: F)
    where
        F: FnOnce(&[u8]) -> ClientResult<T> + Send + 'static,
    {
        match self.handlers.iter_mut().find(|(p, _)| *p == pattern) {
            Some(slot) => slot.1 = Box::new(handler),
            None => self.handlers.push((pattern, Box::new(handler))),
        }
    }

    pub fn patterns(&self) -> impl Iterator<Item = &StatusPattern> {
        self.handlers.iter().map(|(pattern, _)| pattern)
    }

    /// Run the handler selected for `status`.
    ///
    /// A status no pattern handles is an [`ClientError::UnhandledStatusCode`]
    /// carrying the raw body.
    pub fn dispatch(mut self, status: u16, body: &[u8]) -> ClientResult<T> {
        match StatusPattern::select(self.patterns(), status) {
            Some(index) => {
                let (_, handler) = self.handlers.swap_remove(index);
                handler(body)
            }
            None => Err(ClientError::UnhandledStatusCode {
                status,
                body: body.to_vec(),
            }),
        }
    }
}

impl<T> Default for ResponseDispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ResponseDispatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseDispatcher")
            .field("patterns", &self.patterns().collect::<Vec<_>>())
            .finish()
    }
}

/// Decode a response body declared with `content_type`.
///
/// JSON media types are parsed as JSON; anything else is handed to the
/// target type as a string.
pub fn decode_body<T: DeserializeOwned>(content_type: &str, body: &[u8]) -> ClientResult<T> {
    if is_json(content_type) {
        serde_json::from_slice(body).map_err(ClientError::Decode)
    } else {
        let text = String::from_utf8_lossy(body).into_owned();
        serde_json::from_value(JsonValue::String(text)).map_err(ClientError::Decode)
    }
}

pub(crate) fn is_json(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}
