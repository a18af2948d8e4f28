//! Scan coordinator - drives one scan from discovery to the finished index
//!
//! The coordinator is responsible for:
//! - Discovering the images and submitting one parse job per image
//! - Waiting until every job has merged its entry
//! - Filling in empty metadata for jobs that failed in the pool
//! - Shutting the pool down and handing back the index

use crate::chunk::{parse_file, ParsedFile};
use crate::config::SiftConfig;
use crate::discovery::{discover, DirectoryListing, FsListing, Job};
use crate::error::{FileOutcome, Result};
use crate::index::{matching_entries, MetadataIndex, SearchTerms, SharedIndex};
use crate::pool::{PoolConfig, PoolSummary, TaskPool};
use crate::relocate::{relocate, RelocationReport};
use crate::scan::{ScanCounters, ScanProgress, ScanStats};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Reads one image into its metadata
type ParseFn = fn(&Path) -> ParsedFile;

/// Result of a completed scan
#[derive(Debug)]
pub struct ScanResult {
    /// One entry per discovered image
    pub index: MetadataIndex,

    /// Discovered images, sorted by file name
    pub jobs: Vec<Job>,

    /// Per-image outcome, in `jobs` order
    pub outcomes: Vec<FileOutcome>,

    pub stats: ScanStats,

    /// Totals reported by the pool at shutdown
    pub pool: PoolSummary,

    /// Time taken for the scan
    pub duration: Duration,
}

/// Coordinates discovery and the parallel parse of one folder
pub struct ScanCoordinator {
    /// Configuration
    config: Arc<SiftConfig>,

    /// Directory source
    listing: Box<dyn DirectoryListing + Send + Sync>,

    /// Counters shared with jobs and the progress thread
    counters: Arc<ScanCounters>,

    /// Set once the scan is over (stops the progress thread)
    done: Arc<AtomicBool>,

    parse: ParseFn,
}

impl ScanCoordinator {
    /// Create a coordinator that lists the folder from the filesystem
    pub fn new(config: SiftConfig) -> Self {
        Self::with_listing(config, FsListing::default())
    }

    /// Create a coordinator over a custom directory source
    pub fn with_listing<L>(config: SiftConfig, listing: L) -> Self
    where
        L: DirectoryListing + Send + Sync + 'static,
    {
        Self {
            config: Arc::new(config),
            listing: Box::new(listing),
            counters: Arc::new(ScanCounters::new()),
            done: Arc::new(AtomicBool::new(false)),
            parse: parse_file,
        }
    }

    /// Replace the per-image parser
    #[cfg(test)]
    pub(crate) fn with_parser(mut self, parse: ParseFn) -> Self {
        self.parse = parse;
        self
    }

    pub fn config(&self) -> &SiftConfig {
        &self.config
    }

    /// Run the scan with a progress callback polled every 100ms
    ///
    /// The callback always sees at least one update, the last one taken
    /// after every job has finished.
    pub fn run_with_progress<F>(self, progress_callback: F) -> Result<ScanResult>
    where
        F: Fn(ScanProgress) + Send + 'static,
    {
        let start = Instant::now();
        let done = Arc::clone(&self.done);
        let counters = Arc::clone(&self.counters);
        let total_workers = self.config.worker_count;

        let progress_handle = thread::spawn(move || loop {
            let finished = done.load(Ordering::SeqCst);
            let stats = counters.snapshot();
            progress_callback(ScanProgress {
                processed: stats.processed,
                total: stats.files,
                bytes: stats.bytes,
                records: stats.records,
                unreadable: stats.unreadable,
                total_workers,
                elapsed: start.elapsed(),
            });
            if finished {
                break;
            }
            thread::sleep(Duration::from_millis(100));
        });

        let done = Arc::clone(&self.done);
        let result = self.run();

        done.store(true, Ordering::SeqCst);
        let _ = progress_handle.join();

        result
    }

    /// Run the scan
    pub fn run(self) -> Result<ScanResult> {
        let start = Instant::now();

        info!(
            folder = %self.config.folder.display(),
            workers = self.config.worker_count,
            "Starting scan"
        );

        let jobs = discover(
            self.listing.as_ref(),
            &self.config.folder,
            self.config.identity_mode,
        )?;
        self.counters
            .total
            .store(jobs.len() as u64, Ordering::Relaxed);
        info!(images = jobs.len(), "Discovered images");

        let index = Arc::new(SharedIndex::with_capacity(jobs.len()));
        let pool = TaskPool::new(PoolConfig {
            workers: self.config.worker_count,
            queue_capacity: self.config.queue_size,
        })?;

        let handles: Vec<_> = jobs
            .iter()
            .map(|job| {
                let index = Arc::clone(&index);
                let counters = Arc::clone(&self.counters);
                let job = job.clone();
                let parse = self.parse;
                pool.submit(move || parse_job(parse, job, &index, &counters))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(jobs.len());
        for (job, result) in jobs.iter().zip(pool.await_all(handles)) {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(error) => {
                    warn!(
                        file = %job.path.display(),
                        error = %error,
                        "Parse job failed; indexing empty metadata"
                    );
                    index.merge_if_absent(job.identity.clone(), String::new());
                    self.counters.record_failed();
                    FileOutcome::Failed {
                        identity: job.identity.clone(),
                        error,
                    }
                }
            };
            outcomes.push(outcome);
        }

        let pool_summary = pool.shutdown()?;

        // Every job closure is gone after shutdown, so this is the last Arc
        let index = Arc::try_unwrap(index)
            .map(SharedIndex::into_index)
            .unwrap_or_else(|shared| shared.snapshot());

        let stats = self.counters.snapshot();
        let duration = start.elapsed();

        info!(
            images = stats.files,
            with_metadata = stats.with_metadata,
            unreadable = stats.unreadable,
            failed = stats.failed,
            records = stats.records,
            duration_ms = duration.as_millis() as u64,
            "Scan completed"
        );

        Ok(ScanResult {
            index,
            jobs,
            outcomes,
            stats,
            pool: pool_summary,
            duration,
        })
    }
}

/// Body of one pool job: parse outside any lock, then merge
fn parse_job(parse: ParseFn, job: Job, index: &SharedIndex, counters: &ScanCounters) -> FileOutcome {
    let parsed = parse(&job.path);
    counters.record_parsed(&parsed);

    if let Some(stop) = &parsed.stats.stop {
        debug!(file = %job.path.display(), stop = ?stop, "Chunk walk ended");
    }

    let outcome = match &parsed.open_error {
        Some(reason) => {
            warn!(
                file = %job.path.display(),
                error = %reason,
                "Unreadable image; indexing empty metadata"
            );
            FileOutcome::Unreadable {
                identity: job.identity.clone(),
                reason: reason.clone(),
            }
        }
        None => FileOutcome::Parsed {
            identity: job.identity.clone(),
            records: parsed.stats.text_records as usize,
        },
    };

    index.merge(job.identity, parsed.metadata);
    outcome
}

/// Outcome of a full scan, filter and move
#[derive(Debug)]
pub struct SiftReport {
    pub scan: ScanResult,

    /// Entries left after filtering
    pub matched: MetadataIndex,

    pub relocation: RelocationReport,
}

impl SiftReport {
    pub fn matched_count(&self) -> usize {
        self.matched.len()
    }
}

/// Scan `config.folder`, keep entries containing every term, and move them
pub fn sift(config: SiftConfig, terms: &SearchTerms) -> Result<SiftReport> {
    let scan = ScanCoordinator::new(config.clone()).run()?;
    finish_sift(&config, scan, terms)
}

/// Filter and relocate the result of an already-run scan
pub fn finish_sift(config: &SiftConfig, scan: ScanResult, terms: &SearchTerms) -> Result<SiftReport> {
    let matched = matching_entries(&scan.index, terms);
    let removed = scan.index.len() - matched.len();
    info!(
        terms = %terms,
        matched = matched.len(),
        removed = removed,
        "Filtered index"
    );

    let survivors = scan
        .jobs
        .iter()
        .filter(|job| matched.contains_key(&job.identity));
    let relocation = relocate(
        Path::new(&config.folder),
        survivors,
        &config.output_name,
        config.dry_run,
    )?;

    Ok(SiftReport {
        scan,
        matched,
        relocation,
    })
}
