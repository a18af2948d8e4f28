//! Error types for png-sift
//!
//! This module defines the error hierarchy for:
//! - Configuration and CLI errors
//! - Directory discovery errors
//! - Worker pool and per-job errors
//! - Relocation of matched files
//! - Chunk stream errors (internal to the parser)
//!
//! The core pipeline never fails on a single bad file: unreadable or
//! malformed images degrade to empty metadata. Only the edges (bad config,
//! unlistable folder, output folder that cannot be recreated) are fatal.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the png-sift application
#[derive(Error, Debug)]
pub enum SiftError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Directory discovery errors
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Relocation errors
    #[error("Relocation error: {0}")]
    Relocate(#[from] RelocateError),

    /// I/O errors (terminal, file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid queue size
    #[error("Invalid queue size {size}: must be at least {min}")]
    InvalidQueueSize { size: usize, min: usize },

    /// Folder does not exist or is not a directory
    #[error("Folder '{path}' does not exist or is not a directory")]
    FolderNotFound { path: PathBuf },

    /// Folder was neither given nor prompted for
    #[error("No folder to scan was provided")]
    MissingFolder,

    /// Output subfolder name is unusable
    #[error("Invalid output folder name '{name}': {reason}")]
    InvalidOutputName { name: String, reason: String },
}

/// Errors listing the folder to scan
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// The folder could not be listed at all
    #[error("Failed to list folder '{path}': {reason}")]
    ListFailed { path: PathBuf, reason: String },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker thread panicked outside of a job
    #[error("Worker {id} panicked: {message}")]
    Panicked { id: usize, message: String },

    /// Worker thread could not be spawned
    #[error("Failed to initialize worker {id}: {reason}")]
    InitFailed { id: usize, reason: String },
}

/// Outcome of waiting on a single job handle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The job's closure panicked; the worker survived
    #[error("Job {job} panicked: {message}")]
    Panicked { job: u64, message: String },

    /// The job was dropped before it produced a result
    #[error("Job {job} was abandoned before completion")]
    Abandoned { job: u64 },
}

/// Errors moving matched files into the output folder
#[derive(Error, Debug, Clone)]
pub enum RelocateError {
    /// The output folder could not be removed/recreated
    #[error("Failed to prepare output folder '{path}': {reason}")]
    PrepareFailed { path: PathBuf, reason: String },

    /// A single file could not be moved
    #[error("Failed to move '{file}': {reason}")]
    MoveFailed { file: String, reason: String },
}

/// Reasons the chunk walk stopped
///
/// These never escape the parser; `parse_metadata` turns them into a
/// stopping point and keeps whatever text was already collected.
#[derive(Error, Debug)]
pub enum ChunkError {
    /// Stream ended (or came up short) while reading a field
    #[error("Stream truncated at offset {offset} while reading {field}")]
    Truncated { offset: u64, field: &'static str },

    /// Underlying reader failed
    #[error("Read failed at offset {offset}: {source}")]
    Io {
        offset: u64,
        #[source]
        source: std::io::Error,
    },
}

impl ChunkError {
    /// Build from an I/O error, treating EOF as truncation
    pub fn from_io(err: std::io::Error, offset: u64, field: &'static str) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            ChunkError::Truncated { offset, field }
        } else {
            ChunkError::Io { offset, source: err }
        }
    }

    /// True when the stream simply ran out of bytes
    pub fn is_truncation(&self) -> bool {
        matches!(self, ChunkError::Truncated { .. })
    }
}

/// Result type alias for SiftError
pub type Result<T> = std::result::Result<T, SiftError>;

/// Represents the outcome of processing a single image file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Parsed; `records` text records were recovered
    Parsed { identity: String, records: usize },

    /// File could not be opened or read; metadata is empty
    Unreadable { identity: String, reason: String },

    /// The job failed inside the pool; metadata is empty
    Failed { identity: String, error: JobError },
}

impl FileOutcome {
    /// Returns true if the file was read
    pub fn is_parsed(&self) -> bool {
        matches!(self, FileOutcome::Parsed { .. })
    }

    /// Returns the identity associated with this outcome
    pub fn identity(&self) -> &str {
        match self {
            FileOutcome::Parsed { identity, .. } => identity,
            FileOutcome::Unreadable { identity, .. } => identity,
            FileOutcome::Failed { identity, .. } => identity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_error_eof_is_truncation() {
        let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short");
        let err = ChunkError::from_io(eof, 16, "length");
        assert!(err.is_truncation());
        assert_eq!(
            err.to_string(),
            "Stream truncated at offset 16 while reading length"
        );

        let other = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(!ChunkError::from_io(other, 0, "type").is_truncation());
    }

    #[test]
    fn test_error_conversion() {
        let cfg = ConfigError::MissingFolder;
        let err: SiftError = cfg.into();
        assert!(matches!(err, SiftError::Config(_)));

        let reloc = RelocateError::MoveFailed {
            file: "a.png".into(),
            reason: "denied".into(),
        };
        let err: SiftError = reloc.into();
        assert!(matches!(err, SiftError::Relocate(_)));
    }

    #[test]
    fn test_file_outcome_identity() {
        let outcome = FileOutcome::Unreadable {
            identity: "cat".into(),
            reason: "gone".into(),
        };
        assert_eq!(outcome.identity(), "cat");
        assert!(!outcome.is_parsed());
    }
}
