pub mod backend;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod observability;
pub mod ops;
pub mod registry;
pub mod resilience;

pub use config::ExecutionConfig;
pub use error::{MapAlgebraError, Result};
