//! Bounded, deadline-guarded calls to external model backends

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::timeout;

use super::pipeline::PipelineStage;
use super::DomainError;

/// Limits concurrent embedding/generation calls and applies the caller's
/// deadline. The deadline covers waiting for a permit as well as the call.
#[derive(Debug, Clone)]
pub struct UpstreamLimiter {
    permits: Arc<Semaphore>,
    deadline: Duration,
}

impl UpstreamLimiter {
    pub fn new(max_concurrent: usize, timeout_ms: u64) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            deadline: Duration::from_millis(timeout_ms),
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.deadline.as_millis() as u64
    }

    /// Run an upstream call under a permit and the deadline
    pub async fn call<T, F>(
        &self,
        stage: PipelineStage,
        operation: &str,
        future: F,
    ) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        let guarded = async {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| DomainError::internal("Upstream limiter closed"))?;
            future.await
        };

        match timeout(self.deadline, guarded).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::upstream_timeout(
                stage,
                operation,
                self.timeout_ms(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_call_passes_result_through() {
        let limiter = UpstreamLimiter::new(2, 1000);
        let result = limiter
            .call(PipelineStage::Resolution, "embed", async { Ok::<_, DomainError>(42) })
            .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_call_times_out() {
        let limiter = UpstreamLimiter::new(1, 20);
        let result = limiter
            .call(PipelineStage::Resolution, "embed 'قمح'", async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, DomainError>(())
            })
            .await;

        match result {
            Err(DomainError::UpstreamTimeout {
                stage, timeout_ms, ..
            }) => {
                assert_eq!(stage, PipelineStage::Resolution);
                assert_eq!(timeout_ms, 20);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_permits_bound_concurrency() {
        let limiter = UpstreamLimiter::new(1, 1000);
        let active = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let peak = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let calls = (0..4).map(|_| {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            let limiter = limiter.clone();
            async move {
                limiter
                    .call(PipelineStage::Resolution, "embed", async move {
                        use std::sync::atomic::Ordering;
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        active.fetch_sub(1, Ordering::SeqCst);
                        Ok::<_, DomainError>(())
                    })
                    .await
            }
        });

        futures::future::join_all(calls).await;

        assert_eq!(peak.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
