//! Fault injection for object stores and allocators.
//!
//! [`FaultyObjectStore`] wraps an in-memory store and fails, delays or
//! counts calls according to a plan set up by the test.

use async_trait::async_trait;
use binlog_codec::UniqueId;
use binlog_io::{AllocError, AllocResult, Allocator};
use binlog_storage::{InMemoryObjectStore, ObjectStore, StorageError, StorageResult};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A planned failure for reads of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFault {
    /// Fail the next `n` reads with a retryable error.
    Transient(u32),
    /// Fail every read with a permission error.
    Denied,
}

#[derive(Debug, Default)]
struct FaultPlan {
    reads: HashMap<String, ReadFault>,
    read_latency: HashMap<String, Duration>,
    write_failures: u32,
    fail_all_writes: bool,
    write_latency: Duration,
}

/// An object store that injects failures and latency.
///
/// Every call is counted, failed or not. The peak number of concurrent
/// calls is tracked so tests can check concurrency bounds.
#[derive(Debug)]
pub struct FaultyObjectStore {
    inner: InMemoryObjectStore,
    plan: Mutex<FaultPlan>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    read_attempts: Mutex<HashMap<String, usize>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl FaultyObjectStore {
    /// Creates a healthy, empty store under `root`.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            inner: InMemoryObjectStore::new(root),
            plan: Mutex::new(FaultPlan::default()),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            read_attempts: Mutex::new(HashMap::new()),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &InMemoryObjectStore {
        &self.inner
    }

    /// Stores an object directly, bypassing faults and counters.
    pub async fn seed(&self, key: &str, value: impl Into<Bytes>) {
        // The in-memory store only rejects empty keys.
        let _ = self.inner.write(key, value.into()).await;
    }

    /// Fails the next `times` reads of `key` with a retryable error.
    pub fn fail_reads(&self, key: &str, times: u32) {
        self.plan
            .lock()
            .reads
            .insert(key.to_string(), ReadFault::Transient(times));
    }

    /// Fails every read of `key` with a non-retryable error.
    pub fn deny_reads(&self, key: &str) {
        self.plan.lock().reads.insert(key.to_string(), ReadFault::Denied);
    }

    /// Delays every read of `key`.
    pub fn delay_reads(&self, key: &str, latency: Duration) {
        self.plan
            .lock()
            .read_latency
            .insert(key.to_string(), latency);
    }

    /// Fails the next `times` writes, whatever their key.
    pub fn fail_writes(&self, times: u32) {
        self.plan.lock().write_failures = times;
    }

    /// Fails every write until [`heal`](Self::heal) is called.
    pub fn fail_all_writes(&self) {
        self.plan.lock().fail_all_writes = true;
    }

    /// Delays every write.
    pub fn delay_writes(&self, latency: Duration) {
        self.plan.lock().write_latency = latency;
    }

    /// Clears every planned fault and delay.
    pub fn heal(&self) {
        *self.plan.lock() = FaultPlan::default();
    }

    /// Returns the number of read calls, failed ones included.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Returns the number of write calls, failed ones included.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Returns the number of read calls made for `key`.
    pub fn read_attempts(&self, key: &str) -> usize {
        self.read_attempts.lock().get(key).copied().unwrap_or(0)
    }

    /// Returns the highest number of calls observed in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Returns the stored object under `key`, if any.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.inner.get(key)
    }

    /// Returns every stored key, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }

    fn enter(&self) -> InFlight<'_> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.active)
    }

    fn take_read_fault(&self, key: &str) -> Option<StorageError> {
        let mut plan = self.plan.lock();
        match plan.reads.get_mut(key) {
            Some(ReadFault::Denied) => Some(StorageError::PermissionDenied {
                key: key.to_string(),
            }),
            Some(ReadFault::Transient(0)) | None => None,
            Some(ReadFault::Transient(n)) => {
                *n -= 1;
                Some(StorageError::transient(key, "injected read failure"))
            }
        }
    }

    fn take_write_fault(&self, key: &str) -> Option<StorageError> {
        let mut plan = self.plan.lock();
        if plan.fail_all_writes {
            return Some(StorageError::transient(key, "injected write outage"));
        }
        if plan.write_failures > 0 {
            plan.write_failures -= 1;
            return Some(StorageError::transient(key, "injected write failure"));
        }
        None
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for FaultyObjectStore {
    fn root_path(&self) -> &str {
        self.inner.root_path()
    }

    async fn read(&self, key: &str) -> StorageResult<Bytes> {
        let _in_flight = self.enter();
        self.reads.fetch_add(1, Ordering::SeqCst);
        *self
            .read_attempts
            .lock()
            .entry(key.to_string())
            .or_insert(0) += 1;

        let latency = self.plan.lock().read_latency.get(key).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(err) = self.take_read_fault(key) {
            return Err(err);
        }
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, value: Bytes) -> StorageResult<()> {
        let _in_flight = self.enter();
        self.writes.fetch_add(1, Ordering::SeqCst);

        let latency = self.plan.lock().write_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if let Some(err) = self.take_write_fault(key) {
            return Err(err);
        }
        self.inner.write(key, value).await
    }
}

/// An allocator that succeeds a fixed number of times, then fails.
#[derive(Debug)]
pub struct FailingAllocator {
    next: Mutex<UniqueId>,
    successes_left: Mutex<usize>,
    calls: AtomicUsize,
}

impl FailingAllocator {
    /// Creates an allocator that always fails.
    pub fn always() -> Self {
        Self::after(0)
    }

    /// Creates an allocator that hands out `successes` ids, then fails.
    pub fn after(successes: usize) -> Self {
        Self {
            next: Mutex::new(1),
            successes_left: Mutex::new(successes),
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the number of allocation attempts.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Allocator for FailingAllocator {
    fn alloc_one(&self) -> AllocResult<UniqueId> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut left = self.successes_left.lock();
        if *left == 0 {
            return Err(AllocError::Unavailable("injected allocator failure".into()));
        }
        *left -= 1;
        let mut next = self.next.lock();
        let id = *next;
        *next += 1;
        Ok(id)
    }
}
