//! png-sift - Filter PNG images by their embedded text metadata
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use console::Term;
use png_sift::config::{CliArgs, SiftConfig};
use png_sift::discovery::{count_images, FsListing};
use png_sift::index::SearchTerms;
use png_sift::progress::{print_header, print_summary, ProgressReporter};
use png_sift::prompt::{choose_console, is_interactive, prompt_folder, prompt_terms, report_image_count};
use png_sift::scan::{finish_sift, ScanCoordinator};
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let mut args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    let term = Term::stdout();
    let interactive = is_interactive(&term);
    let mut console = choose_console(interactive, term, io::stdin().lock(), io::stdout());

    // Missing folder: prompt, then report what is in it
    if args.folder.is_none() {
        println!("This program filters the images of a folder using their textual PNG metadata.");
        let folder = prompt_folder(console.as_mut()).context("Failed to read folder path")?;
        let count = count_images(&FsListing::default(), &folder)
            .context("Failed to list folder")?;
        report_image_count(console.as_mut(), count)?;
        args.folder = Some(folder);
    }

    let cli_terms = args.terms.take();

    // Validate and create config
    let config = SiftConfig::from_args(args).context("Invalid configuration")?;

    if config.show_progress {
        print_header(
            &config.folder,
            config.worker_count,
            cli_terms.as_deref().map(SearchTerms::parse).as_ref(),
            &config.output_path().display().to_string(),
        );
    }

    let progress = if config.show_progress {
        Some(Arc::new(ProgressReporter::new()))
    } else {
        None
    };

    // Run the scan
    let coordinator = ScanCoordinator::new(config.clone());
    let scan = match &progress {
        Some(reporter) => {
            reporter.set_status("Scanning images...");
            let reporter = Arc::clone(reporter);
            coordinator.run_with_progress(move |p| reporter.update(&p))
        }
        None => coordinator.run(),
    }
    .context("Scan failed")?;

    if let Some(reporter) = &progress {
        reporter.finish("Finished processing all files");
    }

    // Terms are asked for after the scan, as in the interactive flow
    let terms = match cli_terms {
        Some(csv) => SearchTerms::parse(&csv),
        None => SearchTerms::parse(&prompt_terms(console.as_mut()).context("Failed to read search terms")?),
    };

    let report = finish_sift(&config, scan, &terms).context("Failed to move matched images")?;

    if config.show_progress {
        print_summary(&report);
    }

    if !report.relocation.is_clean() {
        info!(
            failures = report.relocation.failure_count(),
            "Sift completed with move failures"
        );
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("png_sift=debug,warn")
    } else {
        EnvFilter::new("png_sift=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
