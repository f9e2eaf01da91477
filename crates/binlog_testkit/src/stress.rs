//! Upload stress runs.
//!
//! These runs drive many concurrent uploads through one shared service and
//! report throughput.

use crate::fixtures::{sample_delete_data, sample_insert_data, sample_meta, sample_pk_stats};
use binlog_io::{BinlogIo, BinlogUploader, CancelSignal};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of a stress run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the run.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress runs.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of segments to flush.
    pub segments: usize,
    /// Number of concurrent uploaders.
    pub uploaders: usize,
    /// Rows per insert batch.
    pub rows_per_segment: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            segments: 64,
            uploaders: 8,
            rows_per_segment: 128,
        }
    }
}

/// Flushes `config.segments` segments (insert, stats and delta logs each)
/// from `config.uploaders` concurrent uploaders.
///
/// One operation is one segment flush.
pub async fn stress_concurrent_flushes(io: &BinlogIo, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let next_segment = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();

    let uploaders: Vec<_> = (0..config.uploaders.max(1))
        .map(|_| {
            let io = io.clone();
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let next_segment = Arc::clone(&next_segment);
            let segments = config.segments;
            let rows = config.rows_per_segment;

            tokio::spawn(async move {
                let meta = sample_meta();
                let cancel = CancelSignal::new();
                loop {
                    let segment = next_segment.fetch_add(1, Ordering::SeqCst);
                    if segment >= segments {
                        break;
                    }
                    let segment_id = segment as i64 + 1;
                    let data = sample_insert_data(rows);
                    let stats = sample_pk_stats(&data);

                    let flushed = async {
                        io.upload_stats_log(
                            &cancel,
                            segment_id,
                            1,
                            Some(&data),
                            &stats,
                            rows as u64,
                            &meta,
                        )
                        .await?;
                        io.upload_delta_log(&cancel, segment_id, 1, &sample_delete_data(4), &meta)
                            .await
                    }
                    .await;

                    match flushed {
                        Ok(_) => successful.fetch_add(1, Ordering::SeqCst),
                        Err(_) => failed.fetch_add(1, Ordering::SeqCst),
                    };
                }
            })
        })
        .collect();

    for uploader in uploaders {
        if uploader.await.is_err() {
            failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    StressTestResult::new(
        successful.load(Ordering::SeqCst),
        failed.load(Ordering::SeqCst),
        start.elapsed(),
    )
}
