//! Generation backend HTTP client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use tracing::{debug, warn};

use crate::backend::GenerationBackend;
use crate::config::GenClientConfig;
use crate::error::{GenError, GenResult};
use crate::metrics::record_request;
use crate::types::{
    HealthResponse, LaunchBatchRequest, LaunchBatchResponse, ModelCatalogResponse,
    PollStatusRequest, PollStatusResponse,
};

const LAUNCH_PATH: &str = "/api/generate/modular";
const POLL_PATH: &str = "/api/poll/modular-status";
const CATALOG_PATH: &str = "/api/generate/models";
const HEALTH_PATH: &str = "/health";

/// Status label for requests that never got an HTTP response.
const CONNECTION_FAILED: u16 = 0;

/// Client for the generation backend.
pub struct GenerationClient {
    http: Client,
    config: GenClientConfig,
}

impl GenerationClient {
    /// Create a new client.
    pub fn new(config: GenClientConfig) -> GenResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GenError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> GenResult<Self> {
        Self::new(GenClientConfig::from_env())
    }

    pub fn config(&self) -> &GenClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Check if the backend is healthy.
    pub async fn health_check(&self) -> GenResult<bool> {
        let url = self.endpoint(HEALTH_PATH);

        match self.authorized(self.http.get(&url)).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("Generation backend health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Generation backend health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> GenResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = GenResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "Generation backend request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(GenError::RequestFailed("Unknown error".to_string())))
    }
}

#[async_trait]
impl GenerationBackend for GenerationClient {
    async fn launch_batch(&self, request: &LaunchBatchRequest) -> GenResult<LaunchBatchResponse> {
        let url = self.endpoint(LAUNCH_PATH);
        debug!(scenes = request.scenes.len(), "Sending launch request to {}", url);

        let started = Instant::now();
        let response = self
            .authorized(self.http.post(&url))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                record_request("launch", CONNECTION_FAILED, started.elapsed());
                GenError::launch_batch(None, e.to_string())
            })?;

        let status = response.status();
        record_request("launch", status.as_u16(), started.elapsed());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenError::launch_batch(Some(status.as_u16()), body));
        }

        response.json::<LaunchBatchResponse>().await.map_err(|e| {
            GenError::launch_batch(Some(status.as_u16()), format!("invalid response body: {}", e))
        })
    }

    async fn poll_status(&self, request: &PollStatusRequest) -> GenResult<PollStatusResponse> {
        let url = self.endpoint(POLL_PATH);
        debug!(jobs = request.poll_urls.len(), "Sending status request to {}", url);

        let started = Instant::now();
        let response = self
            .authorized(self.http.post(&url))
            .json(request)
            .send()
            .await
            .inspect_err(|_| record_request("poll", CONNECTION_FAILED, started.elapsed()))?;

        let status = response.status();
        record_request("poll", status.as_u16(), started.elapsed());

        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(GenError::ServiceUnavailable(format!("{} returned {}", url, status)));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenError::request_failed(format!(
                "Generation backend returned {}: {}",
                status, body
            )));
        }

        response
            .json::<PollStatusResponse>()
            .await
            .map_err(|e| GenError::invalid_response(e.to_string()))
    }

    async fn fetch_catalog(&self) -> GenResult<ModelCatalogResponse> {
        let url = self.endpoint(CATALOG_PATH);

        self.with_retry(|| async {
            let started = Instant::now();
            let response = self
                .authorized(self.http.get(&url))
                .send()
                .await
                .inspect_err(|_| record_request("catalog", CONNECTION_FAILED, started.elapsed()))?;
            let status = response.status();
            record_request("catalog", status.as_u16(), started.elapsed());

            if !status.is_success() {
                return Err(GenError::request_failed(format!(
                    "Model catalog returned {}",
                    status
                )));
            }

            response
                .json::<ModelCatalogResponse>()
                .await
                .map_err(|e| GenError::invalid_response(e.to_string()))
        })
        .await
    }
}
