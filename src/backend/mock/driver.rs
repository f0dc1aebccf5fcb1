use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::{sleep, Duration};

use super::InMemoryProvider;
use crate::backend::{JobDriver, JobError, KernelJob, PyramidDescriptor};

/// Job driver that records every submission and "runs" the job by copying the
/// input pyramid's metadata to the output name.
///
/// Failures and cancellations can be queued up front; each queued outcome is
/// consumed by one submission.
pub struct RecordingJobDriver {
    provider: Arc<InMemoryProvider>,
    submissions: Mutex<Vec<KernelJob>>,
    scripted: Mutex<VecDeque<JobError>>,
    delay: Option<Duration>,
}

impl RecordingJobDriver {
    pub fn new(provider: Arc<InMemoryProvider>) -> Self {
        Self {
            provider,
            submissions: Mutex::new(Vec::new()),
            scripted: Mutex::new(VecDeque::new()),
            delay: None,
        }
    }

    /// Makes every job take at least `delay` to finish.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_next(&self, reason: impl Into<String>) {
        self.scripted().push_back(JobError::Failed(reason.into()));
    }

    pub fn cancel_next(&self) {
        self.scripted().push_back(JobError::Cancelled);
    }

    pub fn submission_count(&self) -> usize {
        self.submissions().len()
    }

    pub fn submissions(&self) -> Vec<KernelJob> {
        self.recorded().clone()
    }

    // A panicking test thread must not drop scripted outcomes or records.
    fn scripted(&self) -> MutexGuard<'_, VecDeque<JobError>> {
        self.scripted.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<KernelJob>> {
        self.submissions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl JobDriver for RecordingJobDriver {
    async fn submit(&self, job: KernelJob) -> Result<(), JobError> {
        tracing::debug!(input = %job.input, output = %job.output, method = job.method.name(), "job submitted");

        self.recorded().push(job.clone());

        if let Some(delay) = self.delay {
            sleep(delay).await;
        }

        let scripted = self.scripted().pop_front();
        if let Some(err) = scripted {
            return Err(err);
        }

        let input = self
            .provider
            .get(&job.input)
            .ok_or_else(|| JobError::Failed(format!("input pyramid '{}' not found", job.input)))?;

        self.provider.insert(PyramidDescriptor {
            name: job.output,
            ..input
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::KernelMethod;
    use crate::ExecutionConfig;

    fn job() -> KernelJob {
        KernelJob {
            method: KernelMethod::Gaussian { sigma: 1.0 },
            input: "elevation".to_string(),
            output: "out/blur".to_string(),
            config: ExecutionConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_scripted_failure_survives_poisoned_lock() {
        let provider = Arc::new(InMemoryProvider::new());
        provider.insert(PyramidDescriptor::new("elevation", 10, 512, 1));
        let driver = Arc::new(RecordingJobDriver::new(provider));

        let poisoner = driver.clone();
        let _ = std::thread::spawn(move || {
            let _scripted = poisoner.scripted.lock().unwrap();
            let _submissions = poisoner.submissions.lock().unwrap();
            panic!("poison both locks");
        })
        .join();
        assert!(driver.scripted.is_poisoned());

        driver.fail_next("executor lost");
        let result = driver.submit(job()).await;

        assert_eq!(result, Err(JobError::Failed("executor lost".to_string())));
        assert_eq!(driver.submission_count(), 1);
        assert!(driver.submit(job()).await.is_ok());
    }
}
