//! png-sift - Filter PNG images by their embedded text metadata
//!
//! Scans a folder of PNG files, recovers every `tEXt` keyword/text record
//! without decoding image data, and moves the images whose metadata
//! contains all of a set of search terms into a fresh subfolder.
//!
//! # Features
//!
//! - **Header-only Parsing**: Walks the chunk stream and seeks over every
//!   non-text chunk, so large images cost a few small reads each.
//!
//! - **Parallel Scanning**: A fixed pool of worker threads parses files
//!   concurrently and merges results into one shared index.
//!
//! - **Never Fails on Bad Input**: Truncated, garbage or unreadable files
//!   get an empty entry instead of aborting the scan.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Image Folder                               │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │ discover (*.png, non-recursive)
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        TaskPool                                  │
//! │            ┌──────────────────────────┐                          │
//! │            │    Job Queue             │                          │
//! │            │  (mutex + condvar)       │                          │
//! │            └────────────┬─────────────┘                          │
//! │       ┌────────────┬────┴───────┬────────────────────┐           │
//! │  ┌────▼────┐  ┌────▼────┐  ┌────▼────┐         ┌────▼────┐      │
//! │  │Worker 1 │  │Worker 2 │  │Worker 3 │  ...    │Worker N │      │
//! │  │ chunk   │  │ chunk   │  │ chunk   │         │ chunk   │      │
//! │  │ reader  │  │ reader  │  │ reader  │         │ reader  │      │
//! │  └────┬────┘  └────┬────┘  └────┬────┘         └────┬────┘      │
//! │       └────────────┴─────┬──────┴────────────────────┘           │
//! │                          ▼                                       │
//! │            ┌──────────────────────────┐                          │
//! │            │      SharedIndex         │                          │
//! │            │  identity -> metadata    │                          │
//! │            └──────────────────────────┘                          │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │ filter (AND, case-insensitive)
//!                               ▼
//!                    ┌──────────────────┐
//!                    │ Filtered_Search/ │
//!                    └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Move every image whose prompt mentions both terms
//! png-sift ./renders -t "portrait, studio lighting"
//!
//! # See what would match without touching the folder
//! png-sift ./renders -t cat --dry-run
//! ```

pub mod chunk;
pub mod config;
pub mod discovery;
pub mod error;
pub mod index;
pub mod pool;
pub mod progress;
pub mod prompt;
pub mod relocate;
pub mod scan;

pub use chunk::{parse_file, parse_metadata, ChunkReader, ParsedFile, TextRecord};
pub use config::{CliArgs, SiftConfig};
pub use discovery::{discover, DirectoryListing, FsListing, IdentityMode, Job};
pub use error::{Result, SiftError};
pub use index::{filter_index, MetadataIndex, SearchTerms, SharedIndex};
pub use pool::{JobHandle, PoolConfig, TaskPool};
pub use relocate::{relocate, RelocationReport};
pub use scan::{sift, ScanCoordinator, ScanResult, SiftReport};
