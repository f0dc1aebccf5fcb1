pub mod driver;
pub mod provider;

pub use driver::RecordingJobDriver;
pub use provider::InMemoryProvider;
