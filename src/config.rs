//! Configuration types for png-sift
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::discovery::IdentityMode;
use crate::error::ConfigError;
use clap::Parser;
use std::path::{Component, Path, PathBuf};

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 256;

/// Minimum queue size
const MIN_QUEUE_SIZE: usize = 1;

/// Subfolder matched images are moved into
pub const DEFAULT_OUTPUT_NAME: &str = "Filtered_Search";

/// Filter PNG images by their embedded text metadata
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "png-sift",
    version,
    about = "Filter PNG images by their embedded tEXt metadata",
    long_about = "Reads the tEXt keyword/text records of every .png file in a folder,\n\
                  keeps the images whose metadata contains all of the given terms\n\
                  (case-insensitive), and moves them into a fresh subfolder.\n\n\
                  The folder and terms are prompted for when not given.",
    after_help = "EXAMPLES:\n    \
        png-sift ./renders -t \"portrait, studio lighting\"\n    \
        png-sift ./renders -t cat -w 4 -o Cats\n    \
        png-sift ./renders -t \"steps: 30\" --dry-run\n    \
        png-sift                                     # prompt for folder and terms"
)]
pub struct CliArgs {
    /// Folder containing the .png files (prompted for if omitted)
    #[arg(value_name = "FOLDER")]
    pub folder: Option<PathBuf>,

    /// Comma-separated search terms; all must match (prompted for if omitted)
    #[arg(short = 't', long, value_name = "CSV")]
    pub terms: Option<String>,

    /// Number of worker threads parsing files
    #[arg(
        short = 'w',
        long,
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub workers: usize,

    /// Maximum jobs waiting for a worker (unbounded if not set)
    #[arg(long, value_name = "NUM")]
    pub queue_size: Option<usize>,

    /// Name of the subfolder matches are moved into
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT_NAME, value_name = "NAME")]
    pub output_name: String,

    /// Derive identities by dropping the last four characters of the name
    #[arg(long)]
    pub literal_identity: bool,

    /// Report matches without moving anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (per-file debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn default_workers() -> usize {
    // Parsing is mostly I/O on small headers; one thread per core is enough
    num_cpus::get().clamp(1, MAX_WORKERS)
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct SiftConfig {
    /// Folder being scanned
    pub folder: PathBuf,

    /// Number of worker threads
    pub worker_count: usize,

    /// Pending-job capacity (`None` = unbounded)
    pub queue_size: Option<usize>,

    /// Output subfolder name (a single path component)
    pub output_name: String,

    /// Identity derivation rule
    pub identity_mode: IdentityMode,

    /// Skip the move step
    pub dry_run: bool,

    /// Show progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl SiftConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let folder = args.folder.ok_or(ConfigError::MissingFolder)?;
        if !folder.is_dir() {
            return Err(ConfigError::FolderNotFound { path: folder });
        }

        // Validate worker count
        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        // Validate queue size
        if let Some(size) = args.queue_size {
            if size < MIN_QUEUE_SIZE {
                return Err(ConfigError::InvalidQueueSize {
                    size,
                    min: MIN_QUEUE_SIZE,
                });
            }
        }

        validate_output_name(&args.output_name)?;

        let identity_mode = if args.literal_identity {
            IdentityMode::Literal
        } else {
            IdentityMode::Extension
        };

        Ok(Self {
            folder,
            worker_count: args.workers,
            queue_size: args.queue_size,
            output_name: args.output_name,
            identity_mode,
            dry_run: args.dry_run,
            show_progress: !args.quiet,
            verbose: args.verbose,
        })
    }

    /// Configuration for `folder` with default settings
    pub fn for_folder(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            worker_count: default_workers(),
            queue_size: None,
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            identity_mode: IdentityMode::default(),
            dry_run: false,
            show_progress: false,
            verbose: false,
        }
    }

    /// Full path of the output subfolder
    pub fn output_path(&self) -> PathBuf {
        self.folder.join(&self.output_name)
    }
}

/// The output name must be exactly one normal path component
fn validate_output_name(name: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidOutputName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        (Some(Component::Normal(_)), Some(_)) => Err(invalid("must not contain path separators")),
        _ => Err(invalid("must be a plain folder name")),
    }
}
