//! Scan orchestration
//!
//! ```text
//!   discover ──► submit one job per image ──► TaskPool
//!                                               │ parse_file
//!                                               ▼
//!                                         SharedIndex.merge
//!   await_all ◄─────────────────────────────────┘
//!      │  (failed jobs get empty metadata)
//!      ▼
//!   shutdown ──► ScanResult ──► matching_entries ──► relocate
//! ```

pub mod coordinator;

pub use coordinator::{finish_sift, sift, ScanCoordinator, ScanResult, SiftReport};

use crate::chunk::ParsedFile;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live counters shared with the parse jobs
#[derive(Debug, Default)]
pub struct ScanCounters {
    /// Images discovered (set once before submission)
    pub total: AtomicU64,

    /// Jobs finished, whatever their outcome
    pub processed: AtomicU64,

    /// Images with at least one text record
    pub with_metadata: AtomicU64,

    /// Images that could not be opened or read
    pub unreadable: AtomicU64,

    /// Jobs that panicked inside the pool
    pub failed: AtomicU64,

    pub records: AtomicU64,
    pub oversized_skipped: AtomicU64,
    pub bytes: AtomicU64,
}

impl ScanCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one parsed file
    pub fn record_parsed(&self, parsed: &ParsedFile) {
        if parsed.is_readable() {
            self.bytes.fetch_add(parsed.size, Ordering::Relaxed);
        } else {
            self.unreadable.fetch_add(1, Ordering::Relaxed);
        }
        if parsed.stats.text_records > 0 {
            self.with_metadata.fetch_add(1, Ordering::Relaxed);
        }
        self.records
            .fetch_add(parsed.stats.text_records, Ordering::Relaxed);
        self.oversized_skipped
            .fetch_add(parsed.stats.oversized_skipped, Ordering::Relaxed);
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Account for a job that never produced a result
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ScanStats {
        ScanStats {
            files: self.total.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            with_metadata: self.with_metadata.load(Ordering::Relaxed),
            unreadable: self.unreadable.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            oversized_skipped: self.oversized_skipped.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}

/// Totals for a finished scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub files: u64,
    pub processed: u64,
    pub with_metadata: u64,
    pub unreadable: u64,
    pub failed: u64,
    pub records: u64,
    pub oversized_skipped: u64,
    pub bytes: u64,
}

/// Progress passed to the `run_with_progress` callback
#[derive(Debug, Clone, Copy)]
pub struct ScanProgress {
    /// Jobs finished
    pub processed: u64,

    /// Jobs submitted (0 until discovery completes)
    pub total: u64,

    /// Bytes of image files read
    pub bytes: u64,

    /// Text records recovered
    pub records: u64,

    /// Unreadable images so far
    pub unreadable: u64,

    /// Total workers
    pub total_workers: usize,

    /// Time since the scan started
    pub elapsed: Duration,
}

impl ScanProgress {
    pub fn files_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        }
    }
}
