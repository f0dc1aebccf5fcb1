use async_trait::async_trait;

use super::types::{AccessMode, JobError, KernelJob, ProviderError, PyramidDescriptor};

/// Submits kernel convolutions to the distributed engine and waits for them.
#[async_trait]
pub trait JobDriver: Send + Sync {
    /// May block for as long as the job runs.
    async fn submit(&self, job: KernelJob) -> Result<(), JobError>;
}

/// Resolves logical artifact names to stored pyramids.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn resolve(&self, name: &str, mode: AccessMode) -> Result<PyramidDescriptor, ProviderError>;

    /// Registers `name` as a job output and returns the name the job driver writes to.
    async fn open_output(&self, name: &str) -> Result<String, ProviderError>;
}
