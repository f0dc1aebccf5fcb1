use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;

/// Build lifecycle of a node's output.
///
/// `Unbuilt -> Building -> Built`, or back to `Unbuilt` when a build fails.
/// `Built` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildState {
    Unbuilt,
    Building,
    Built,
}

impl Default for BuildState {
    fn default() -> Self {
        Self::Unbuilt
    }
}

/// Memo cell for a node's output.
///
/// The output goes from absent to present exactly once and is never reset.
/// Builders are serialized by an async lock, so concurrent callers wait for
/// the running build and then see its result instead of starting another.
/// A failed build stores nothing.
pub struct BuildCell<T> {
    output: OnceLock<Arc<T>>,
    guard: Mutex<()>,
}

impl<T> BuildCell<T> {
    pub fn new() -> Self {
        Self {
            output: OnceLock::new(),
            guard: Mutex::new(()),
        }
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.output.get().cloned()
    }

    pub fn state(&self) -> BuildState {
        if self.output.get().is_some() {
            BuildState::Built
        } else if self.guard.try_lock().is_err() {
            BuildState::Building
        } else {
            BuildState::Unbuilt
        }
    }

    /// Returns the stored output, running `build` only if there is none yet.
    pub async fn get_or_try_build<F, Fut, E>(&self, build: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(output) = self.get() {
            return Ok(output);
        }

        let _building = self.guard.lock().await;

        // Another caller may have finished while we waited.
        if let Some(output) = self.get() {
            return Ok(output);
        }

        let value = build().await?;
        Ok(self.output.get_or_init(|| Arc::new(value)).clone())
    }
}

impl<T> Default for BuildCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for BuildCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildCell")
            .field("state", &self.state())
            .field("output", &self.output.get())
            .finish()
    }
}
