//! Support code for generated clients.
//!
//! Generated units import from this module (see
//! [`Config::runtime_crate`](crate::config::Config::runtime_crate)). It holds
//! everything whose behaviour must be identical across generated clients:
//! parameter encoding, status-pattern dispatch, credentials, and request
//! assembly. Executing requests is left to a [`Transport`].

pub mod auth;
pub mod dispatch;
pub mod encoding;
pub mod error;
pub mod request;
pub mod status;
pub mod transport;

pub use crate::openapi::HttpMethod as Method;
pub use auth::{ApiKeyLocation, Credentials, SecurityContext};
pub use dispatch::{decode_body, ResponseDispatcher};
pub use encoding::{encode_deep_object, encode_form, QueryStyle};
pub use error::{ClientError, ClientResult};
pub use request::{HttpRequest, RequestParts};
pub use status::StatusPattern;
pub use transport::{Client, RawResponse, ReqwestTransport, Transport, TransportFuture};
