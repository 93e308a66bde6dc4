use std::future::Future;
use std::sync::Arc;

use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};

use crate::error::TransportError;

/// One request against the backend, relative to the client's base address.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        ApiRequest {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        ApiRequest {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn patch(path: impl Into<String>, body: serde_json::Value) -> Self {
        ApiRequest {
            method: Method::PATCH,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        ApiRequest {
            method: Method::DELETE,
            path: path.into(),
            body: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Transport used by hooks and the proxy. Timeouts and retries are applied by
/// the caller (see [`crate::fetch`]), so an implementation only has to tell
/// a response apart from a transport failure.
pub trait HttpClient: Send + Sync {
    fn send(&self, request: &ApiRequest) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

impl<C: HttpClient> HttpClient for Arc<C> {
    fn send(&self, request: &ApiRequest) -> impl Future<Output = Result<RawResponse, TransportError>> + Send {
        (**self).send(request)
    }
}

/// An HTTP client for the catalogue backend.
pub struct ReqwestClient {
    pub address: String,
    pub inner_client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(address: impl Into<String>) -> Self {
        ReqwestClient {
            address: address.into(),
            inner_client: reqwest::Client::new(),
        }
    }

    fn format_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.address.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl HttpClient for ReqwestClient {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .inner_client
            .request(request.method.clone(), self.format_url(&request.path))
            .header(ACCEPT, "application/json");

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        Ok(RawResponse { status, body })
    }
}

fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Connect(crate::unpack_error(&err))
    }
}
