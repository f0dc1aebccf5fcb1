pub mod mock;
pub mod traits;
pub mod types;

pub use traits::{DataProvider, JobDriver};
pub use types::{AccessMode, JobError, KernelJob, ProviderError, PyramidDescriptor};
