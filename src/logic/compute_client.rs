use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::time::Duration;

use crate::config::ComputeConfig;
use crate::error::AppError;
use crate::model::SolvePayload;

/// Header carrying the compute API key (header names are case-insensitive)
pub const API_KEY_HEADER: &str = "rhinocomputekey";

/// Endpoints of the compute service this server talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Solve,
    Io,
    Health,
    Version,
}

/// One request/response exchange with the compute service. Implementations
/// make a single attempt bounded by `timeout`; retrying is the caller's job.
#[async_trait]
pub trait ComputeClient: Send + Sync {
    async fn post(
        &self,
        endpoint: Endpoint,
        payload: &SolvePayload,
        timeout: Duration,
    ) -> Result<Value, AppError>;

    async fn get(&self, endpoint: Endpoint, timeout: Duration) -> Result<(), AppError>;
}

/// Bound `operation` by `timeout`, reporting an overrun as `UpstreamTimeout`.
/// Callers apply this around every client call, whatever the implementation.
pub async fn within_deadline<T, F>(timeout: Duration, operation: F) -> Result<T, AppError>
where
    F: std::future::Future<Output = Result<T, AppError>>,
{
    tokio::time::timeout(timeout, operation)
        .await
        .map_err(|_| AppError::UpstreamTimeout(timeout))?
}

/// [`ComputeClient`] over HTTP
pub struct HttpComputeClient {
    client: reqwest::Client,
    config: ComputeConfig,
}

impl HttpComputeClient {
    pub fn new(config: ComputeConfig) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(key)
                .map_err(|_| AppError::Internal("compute api key is not a valid header".into()))?;
            headers.insert(API_KEY_HEADER, value);
        }
        if let Some(token) = config.auth_token.as_deref().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| AppError::Internal("compute auth token is not a valid header".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build http client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        let path = match endpoint {
            Endpoint::Solve => &self.config.solve_path,
            Endpoint::Io => &self.config.io_path,
            Endpoint::Health => &self.config.health_path,
            Endpoint::Version => &self.config.version_path,
        };
        self.config.endpoint(path)
    }

    async fn exchange(
        &self,
        request: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<(u16, Bytes), AppError> {
        let response = request.send().await.map_err(|e| classify(e, timeout))?;
        let status = response.status().as_u16();
        let success = response.status().is_success();
        let body = response.bytes().await.map_err(|e| classify(e, timeout))?;
        if !success {
            return Err(AppError::rejected(status, &String::from_utf8_lossy(&body)));
        }
        Ok((status, body))
    }
}

#[async_trait]
impl ComputeClient for HttpComputeClient {
    async fn post(
        &self,
        endpoint: Endpoint,
        payload: &SolvePayload,
        timeout: Duration,
    ) -> Result<Value, AppError> {
        let request = self.client.post(self.url(endpoint)).json(payload);
        let (status, body) = within_deadline(timeout, self.exchange(request, timeout)).await?;

        serde_json::from_slice(&body).map_err(|e| AppError::UpstreamRejected {
            status,
            body: format!("response is not valid JSON: {}", e),
        })
    }

    async fn get(&self, endpoint: Endpoint, timeout: Duration) -> Result<(), AppError> {
        let request = self.client.get(self.url(endpoint));
        within_deadline(timeout, self.exchange(request, timeout)).await?;
        Ok(())
    }
}

fn classify(error: reqwest::Error, timeout: Duration) -> AppError {
    if error.is_timeout() {
        AppError::UpstreamTimeout(timeout)
    } else {
        AppError::UpstreamUnreachable(error.to_string())
    }
}
