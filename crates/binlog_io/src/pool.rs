//! Bounded task pool.
//!
//! Tasks are spawned on the ambient tokio runtime immediately, but each one
//! waits for a permit before running, so at most `capacity` tasks make
//! progress at once. The pool is sized at construction and never resized;
//! clones share the same permits.
//!
//! A task lives only as long as its [`TaskHandle`]: dropping the handle
//! aborts the task and returns its permit.

use crate::config::BinlogIoConfig;
use crate::error::{BinlogIoError, BinlogIoResult};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// A cloneable handle to a fixed-capacity task pool.
#[derive(Debug, Clone)]
pub struct TaskPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl TaskPool {
    /// Creates a pool running at most `capacity` tasks at once.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Creates a pool sized by `config.pool_size`.
    pub fn from_config(config: &BinlogIoConfig) -> Self {
        Self::new(config.pool_size)
    }

    /// Returns the pool capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of tasks currently holding a permit.
    pub fn running(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    /// Submits a task and returns a handle to await its result.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit<F, T>(&self, task: F) -> TaskHandle<T>
    where
        F: Future<Output = BinlogIoResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let inner = tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| BinlogIoError::TaskFailed("task pool closed".to_string()))?;
            task.await
        });
        TaskHandle { inner }
    }
}

/// Handle to a submitted task.
///
/// Dropping the handle before the task finishes aborts the task.
#[derive(Debug)]
pub struct TaskHandle<T> {
    inner: JoinHandle<BinlogIoResult<T>>,
}

impl<T> TaskHandle<T> {
    /// Waits for the task and returns its result.
    ///
    /// # Errors
    ///
    /// Returns the task's own error, or [`BinlogIoError::TaskFailed`] if
    /// the task panicked or was aborted.
    pub async fn join(mut self) -> BinlogIoResult<T> {
        match (&mut self.inner).await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(BinlogIoError::TaskFailed("task aborted".into())),
            Err(e) => Err(BinlogIoError::TaskFailed(e.to_string())),
        }
    }

    /// Aborts the task if it has not finished.
    pub fn abort(&self) {
        self.inner.abort();
    }

    /// Returns true if the task has finished.
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

impl<T> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        self.inner.abort();
    }
}

/// Waits for every handle, then returns the results in submission order or
/// the first error in submission order.
///
/// # Errors
///
/// Returns the first failed task's error once all tasks have finished.
pub async fn await_all<T>(handles: Vec<TaskHandle<T>>) -> BinlogIoResult<Vec<T>> {
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.join().await);
    }
    results.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn pool_bounds_concurrency() {
        let pool = TaskPool::new(2);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                pool.submit(async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(i)
                })
            })
            .collect();

        let results = await_all(handles).await.unwrap();
        assert_eq!(results, (0..8).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.running(), 0);
    }

    #[tokio::test]
    async fn await_all_waits_for_every_task() {
        let pool = TaskPool::new(4);
        let done = Arc::new(AtomicUsize::new(0));

        let failing = pool.submit(async {
            Err::<(), _>(BinlogIoError::TaskFailed("boom".into()))
        });
        let slow = {
            let done = Arc::clone(&done);
            pool.submit(async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };

        let err = await_all(vec![failing, slow]).await.unwrap_err();
        assert!(matches!(err, BinlogIoError::TaskFailed(_)));
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn aborted_task_reports_failure() {
        let pool = TaskPool::new(1);
        let handle = pool.submit(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        });
        handle.abort();
        assert!(matches!(
            handle.join().await,
            Err(BinlogIoError::TaskFailed(_))
        ));
    }

    #[tokio::test]
    async fn dropped_handle_releases_its_permit() {
        let pool = TaskPool::new(1);
        let handle = pool.submit(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(pool.running(), 1);

        drop(handle);
        let next = pool.submit(async { Ok(7) });
        let value = tokio::time::timeout(Duration::from_secs(1), next.join())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(pool.running(), 0);
    }

    #[test]
    fn zero_capacity_is_raised() {
        assert_eq!(TaskPool::new(0).capacity(), 1);
    }
}
