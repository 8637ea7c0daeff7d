//! HTTP readiness probe.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::error::ProbeError;

use super::HealthProbe;

/// Probe that issues a GET against a readiness URL.
///
/// Any 2xx answer counts as healthy; non-success statuses and connection
/// errors are failures.
pub struct HttpProbe {
    url: Url,
    client: Client<HttpConnector, Body>,
}

impl HttpProbe {
    pub fn new(url: Url) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self { url, client }
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn probe(&self) -> Result<(), ProbeError> {
        let request = Request::builder()
            .method("GET")
            .uri(self.url.as_str())
            .header("user-agent", "health-supervisor-probe")
            .body(Body::empty())
            .map_err(|e| ProbeError::Failed(e.to_string()))?;

        match self.client.request(request).await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(ProbeError::Failed(format!(
                "non-success status {}",
                response.status()
            ))),
            Err(e) => Err(ProbeError::Failed(e.to_string())),
        }
    }
}
