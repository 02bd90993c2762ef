use crate::error::PoolError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub const DEFAULT_WORKER_LIMIT: usize = 8;

/// Bounded executor for external calls and CPU-bound extraction.
///
/// Every job holds a permit for its whole run, so at most `capacity` jobs are
/// in flight; further submissions wait for a permit instead of piling onto
/// the runtime.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_LIMIT)
    }
}

impl WorkerPool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Runs an async job on its own task.
    pub async fn run<F, T>(&self, job: F) -> Result<T, PoolError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;

        tokio::spawn(async move {
            let _permit = permit;
            job.await
        })
        .await
        .map_err(|error| PoolError::Join(error.to_string()))
    }

    /// Runs a synchronous job on the blocking thread pool.
    pub async fn run_blocking<F, T>(&self, job: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|error| PoolError::Join(error.to_string()))
    }
}
