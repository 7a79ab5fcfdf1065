//! Sending requests.
//!
//! Generated operations only need a [`Transport`]; [`ReqwestTransport`] is the
//! stock implementation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use url::Url;

use super::error::{ClientError, ClientResult};
use super::request::{HttpRequest, RequestParts};

/// Status and raw body of a received response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = ClientResult<RawResponse>> + Send + 'a>>;

/// Executes a finished request
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// [`Transport`] backed by a shared `reqwest` client
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
                .map_err(|e| ClientError::Transport(Box::new(e)))?;
            let mut builder = self.client.request(method, request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| ClientError::Transport(Box::new(e)))?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response
                .bytes()
                .await
                .map_err(|e| ClientError::Transport(Box::new(e)))?
                .to_vec();
            log::debug!("Received HTTP {} ({} bytes)", status, body.len());

            Ok(RawResponse {
                status,
                headers,
                body,
            })
        })
    }
}

/// Base URL plus transport, shared by all generated operations
#[derive(Clone)]
pub struct Client {
    base_url: Url,
    transport: Arc<dyn Transport>,
}

impl Client {
    pub fn new(base_url: &str, transport: impl Transport + 'static) -> ClientResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            base_url,
            transport: Arc::new(transport),
        })
    }

    /// A client using [`ReqwestTransport`]
    pub fn with_reqwest(base_url: &str) -> ClientResult<Self> {
        Self::new(base_url, ReqwestTransport::default())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn send(&self, request: RequestParts) -> ClientResult<RawResponse> {
        let request = request.into_request(&self.base_url)?;
        log::debug!("{} {}", request.method, request.url);
        self.transport.execute(request).await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}
