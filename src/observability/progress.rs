/// Advisory lifecycle hooks invoked around a node's build.
pub trait Progress: Send + Sync {
    fn starting(&self);
    fn complete(&self);
}

pub struct NoopProgress;

impl Progress for NoopProgress {
    fn starting(&self) {}
    fn complete(&self) {}
}

/// Emits the lifecycle hooks as tracing events.
pub struct LoggingProgress {
    label: String,
}

impl LoggingProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

impl Progress for LoggingProgress {
    fn starting(&self) {
        tracing::debug!(session = %self.label, "build starting");
    }

    fn complete(&self) {
        tracing::debug!(session = %self.label, "build complete");
    }
}
