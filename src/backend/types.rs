use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ExecutionConfig;
use crate::ops::KernelMethod;

/// How a pyramid is opened through the data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessMode {
    Read,
    Write,
}

/// Readable handle on a stored raster pyramid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidDescriptor {
    pub name: String,
    pub max_zoom: u32,
    pub tile_size: u32,
    pub bands: u32,
}

impl PyramidDescriptor {
    pub fn new(name: impl Into<String>, max_zoom: u32, tile_size: u32, bands: u32) -> Self {
        Self {
            name: name.into(),
            max_zoom,
            tile_size,
            bands,
        }
    }
}

/// One kernel convolution submission.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelJob {
    pub method: KernelMethod,
    pub input: String,
    pub output: String,
    pub config: ExecutionConfig,
}

/// Outcome of a job that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("job failed: {0}")]
    Failed(String),

    #[error("job cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("pyramid '{0}' not found")]
    NotFound(String),

    #[error("pyramid '{0}' cannot be opened for output: {1}")]
    OutputUnavailable(String, String),
}
