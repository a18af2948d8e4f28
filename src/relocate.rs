//! Moving matched images into the output subfolder

use crate::discovery::Job;
use crate::error::RelocateError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of one relocation batch
#[derive(Debug, Clone, Default)]
pub struct RelocationReport {
    /// Output folder (recreated unless this was a dry run)
    pub target: PathBuf,

    /// Files moved (or, on a dry run, that would be moved)
    pub moved: Vec<String>,

    /// Per-file failures; the batch kept going past each
    pub failures: Vec<RelocateError>,

    pub dry_run: bool,
}

impl RelocationReport {
    pub fn moved_count(&self) -> usize {
        self.moved.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Recreate `<source_dir>/<subfolder_name>` and move every job's file into it
///
/// Only the folder preparation is fatal. With `dry_run` nothing on disk
/// changes and every job is reported as moved.
pub fn relocate<'a, I>(
    source_dir: &Path,
    jobs: I,
    subfolder_name: &str,
    dry_run: bool,
) -> Result<RelocationReport, RelocateError>
where
    I: IntoIterator<Item = &'a Job>,
{
    let target = source_dir.join(subfolder_name);
    let mut report = RelocationReport {
        target: target.clone(),
        dry_run,
        ..Default::default()
    };

    if dry_run {
        report.moved = jobs.into_iter().map(|j| j.source_name.clone()).collect();
        info!(
            target = %target.display(),
            files = report.moved.len(),
            "Dry run: no files moved"
        );
        return Ok(report);
    }

    prepare_target(&target)?;

    for job in jobs {
        let from = source_dir.join(&job.source_name);
        let to = target.join(&job.source_name);
        match move_file(&from, &to) {
            Ok(()) => {
                debug!(file = %job.source_name, "Moved");
                report.moved.push(job.source_name.clone());
            }
            Err(e) => {
                warn!(file = %job.source_name, error = %e, "Failed to move file");
                report.failures.push(RelocateError::MoveFailed {
                    file: job.source_name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        target = %target.display(),
        moved = report.moved.len(),
        failed = report.failures.len(),
        "Relocation complete"
    );
    Ok(report)
}

/// Remove the folder if present, then create it empty
fn prepare_target(target: &Path) -> Result<(), RelocateError> {
    let prepare_failed = |e: io::Error| RelocateError::PrepareFailed {
        path: target.to_path_buf(),
        reason: e.to_string(),
    };

    match fs::remove_dir_all(target) {
        Ok(()) => debug!(target = %target.display(), "Removed previous output folder"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(prepare_failed(e)),
    }
    fs::create_dir_all(target).map_err(prepare_failed)
}

/// Rename, falling back to copy + remove (e.g. across filesystems)
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(e),
        Err(_) => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}
