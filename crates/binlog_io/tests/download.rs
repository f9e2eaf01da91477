//! Download behaviour against a fault-injecting store.

use binlog_io::{BinlogDownloader, BinlogIoError, CancelSignal};
use binlog_storage::StorageError;
use binlog_testkit::prelude::*;
use std::time::{Duration, Instant};

fn keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{TEST_ROOT}/insert_log/1/2/3/100/{i}")).collect()
}

async fn seeded(n: usize) -> (TestHarness, Vec<String>) {
    let harness = TestHarness::new(4);
    let keys = keys(n);
    for (i, key) in keys.iter().enumerate() {
        harness.store.seed(key, format!("payload-{i}").into_bytes()).await;
    }
    (harness, keys)
}

#[tokio::test]
async fn empty_download_makes_no_calls() {
    let harness = TestHarness::new(4);
    let blobs = harness.io.download(&CancelSignal::new(), &[]).await.unwrap();
    assert!(blobs.is_empty());
    assert_eq!(harness.store.read_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn results_follow_input_order() {
    let (harness, keys) = seeded(6).await;
    // Earlier keys finish last.
    for (i, key) in keys.iter().enumerate() {
        harness
            .store
            .delay_reads(key, Duration::from_millis(5 * (6 - i as u64)));
    }

    let blobs = harness.io.download(&CancelSignal::new(), &keys).await.unwrap();

    assert_eq!(blobs.len(), 6);
    for (i, (blob, key)) in blobs.iter().zip(&keys).enumerate() {
        assert_eq!(&blob.key, key);
        assert_eq!(blob.value.as_ref(), format!("payload-{i}").as_bytes());
    }
}

#[tokio::test]
async fn transient_read_failures_are_retried() {
    let (harness, keys) = seeded(3).await;
    harness.store.fail_reads(&keys[1], 2);

    let blobs = harness.io.download(&CancelSignal::new(), &keys).await.unwrap();

    assert_eq!(blobs.len(), 3);
    assert_eq!(harness.store.read_attempts(&keys[1]), 3);
    assert_eq!(harness.store.read_count(), 5);
}

#[tokio::test]
async fn read_retries_are_bounded() {
    let (harness, keys) = seeded(2).await;
    harness.store.fail_reads(&keys[0], 10);

    let err = harness
        .io
        .download(&CancelSignal::new(), &keys)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BinlogIoError::Storage(StorageError::Transient { .. })
    ));
    assert_eq!(harness.store.read_attempts(&keys[0]), 3);
}

#[tokio::test]
async fn fatal_read_errors_are_not_retried() {
    let (harness, keys) = seeded(2).await;
    harness.store.deny_reads(&keys[1]);

    let err = harness
        .io
        .download(&CancelSignal::new(), &keys)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BinlogIoError::Storage(StorageError::PermissionDenied { .. })
    ));
    assert_eq!(harness.store.read_attempts(&keys[1]), 1);
}

#[tokio::test]
async fn missing_key_fails_the_batch() {
    let (harness, mut keys) = seeded(3).await;
    keys.insert(1, format!("{TEST_ROOT}/insert_log/1/2/3/100/404"));

    let err = harness
        .io
        .download(&CancelSignal::new(), &keys)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BinlogIoError::Storage(StorageError::NotFound { .. })
    ));
    assert_eq!(harness.store.read_attempts(&keys[1]), 1);
}

#[tokio::test]
async fn earliest_failing_key_decides_the_error() {
    let (harness, mut keys) = seeded(2).await;
    harness.store.delay_reads(&keys[0], Duration::from_millis(60));
    harness.store.deny_reads(&keys[0]);
    keys.push(format!("{TEST_ROOT}/insert_log/1/2/3/100/missing"));

    let started = Instant::now();
    let err = harness
        .io
        .download(&CancelSignal::new(), &keys)
        .await
        .unwrap_err();

    // The missing key fails first, but the slower denied key comes first.
    assert!(matches!(
        err,
        BinlogIoError::Storage(StorageError::PermissionDenied { .. })
    ));
    assert!(started.elapsed() >= Duration::from_millis(60));
}

#[tokio::test]
async fn cancelled_download_submits_nothing() {
    let (harness, keys) = seeded(3).await;
    let cancel = CancelSignal::new();
    cancel.cancel();

    let err = harness.io.download(&cancel, &keys).await.unwrap_err();

    assert!(err.is_cancelled());
    assert!(matches!(
        err,
        BinlogIoError::DownloadCancelled {
            submitted: 0,
            total: 3
        }
    ));
    assert_eq!(harness.store.read_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reads_respect_pool_capacity() {
    let harness = TestHarness::new(3);
    let keys = keys(16);
    for key in &keys {
        harness.store.seed(key, b"v".to_vec()).await;
        harness.store.delay_reads(key, Duration::from_millis(5));
    }

    let blobs = harness.io.download(&CancelSignal::new(), &keys).await.unwrap();

    assert_eq!(blobs.len(), 16);
    assert!(harness.store.peak_concurrency() <= 3);
    assert!(harness.store.peak_concurrency() >= 1);
}
