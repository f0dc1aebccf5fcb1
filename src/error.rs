use thiserror::Error;

use crate::backend::{JobError, ProviderError};
use crate::engine::NodeId;

/// Errors raised by operator nodes and the graph around them.
#[derive(Debug, Error)]
pub enum MapAlgebraError {
    /// Malformed expression usage. Raised at parse/attach time, never by `build`.
    #[error("{0}")]
    Argument(String),

    /// `build` was called on a node that never finished configuration.
    #[error("{0}")]
    NotConfigured(String),

    #[error("job producing '{job}' failed: {reason}")]
    JobFailed { job: String, reason: String },

    #[error("job producing '{job}' was cancelled")]
    JobCancelled { job: String },

    /// A node was built before one of its inputs. The scheduler must build
    /// inputs first.
    #[error("{node} cannot build: input {input} has not been built")]
    UpstreamNotReady { node: String, input: NodeId },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl MapAlgebraError {
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    pub(crate) fn from_job(job: impl Into<String>, err: JobError) -> Self {
        let job = job.into();
        match err {
            JobError::Failed(reason) => Self::JobFailed { job, reason },
            JobError::Cancelled => Self::JobCancelled { job },
        }
    }

    /// Only engine-side job failures are worth another submission.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::JobFailed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::JobCancelled { .. })
    }
}

pub type Result<T, E = MapAlgebraError> = std::result::Result<T, E>;
