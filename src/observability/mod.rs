pub mod collector;
pub mod metrics;
pub mod monitor;
pub mod progress;

pub use collector::{MetricsCollector, MetricsSnapshot};
pub use metrics::BuildMetrics;
pub use monitor::BuildMonitor;
pub use progress::{LoggingProgress, NoopProgress, Progress};
