//! Transport seam between the batch logic and the generation backend.

use async_trait::async_trait;

use crate::error::GenResult;
use crate::types::{
    LaunchBatchRequest, LaunchBatchResponse, ModelCatalogResponse, PollStatusRequest,
    PollStatusResponse,
};

/// Remote generation backend.
///
/// `GenerationClient` implements this over HTTP; the launcher and poller
/// only see this trait.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Submit every scene of a batch in one request.
    ///
    /// Any failure is reported as `GenError::LaunchBatch`.
    async fn launch_batch(&self, request: &LaunchBatchRequest) -> GenResult<LaunchBatchResponse>;

    /// Query the status of a set of outstanding jobs.
    async fn poll_status(&self, request: &PollStatusRequest) -> GenResult<PollStatusResponse>;

    /// Fetch the backend's model catalog.
    async fn fetch_catalog(&self) -> GenResult<ModelCatalogResponse>;
}
