//! Progress reporting for the scan
//!
//! Provides a live progress bar using indicatif and the styled summary
//! printed once the sift is done.

use crate::index::SearchTerms;
use crate::scan::{ScanProgress, SiftReport};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Progress bar over the parse jobs
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter; the length is set on first update
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("=> ").tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &ScanProgress) {
        if self.bar.length() != Some(progress.total) {
            self.bar.set_length(progress.total);
        }
        self.bar.set_position(progress.processed);

        let msg = format!(
            "Read: {} | Records: {} | Unreadable: {} | Rate: {:.0}/s | Workers: {}",
            format_size(progress.bytes, BINARY),
            format_number(progress.records),
            format_number(progress.unreadable),
            progress.files_per_second(),
            progress.total_workers,
        );
        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Print a header at the start of the scan
pub fn print_header(folder: &Path, workers: usize, terms: Option<&SearchTerms>, output: &str) {
    println!();
    println!(
        "{} {}",
        style("png-sift").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Folder:").bold(), folder.display());
    match terms {
        Some(terms) => println!("  {} {}", style("Terms:").bold(), terms),
        None => println!("  {} {}", style("Terms:").bold(), style("(asked after scan)").dim()),
    }
    println!("  {} {}", style("Workers:").bold(), workers);
    println!("  {} {}", style("Output:").bold(), output);
    println!();
}

/// Print a summary of the sift results
pub fn print_summary(report: &SiftReport) {
    let stats = &report.scan.stats;
    let duration_secs = report.scan.duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        stats.files as f64 / duration_secs
    } else {
        0.0
    };

    println!();
    println!("{}", style("Sift Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Images:").bold(), format_number(stats.files));
    println!(
        "  {} {}",
        style("With metadata:").bold(),
        format_number(stats.with_metadata)
    );
    println!(
        "  {} {}",
        style("Text records:").bold(),
        format_number(stats.records)
    );
    println!(
        "  {} {}",
        style("Bytes read:").bold(),
        format_size(stats.bytes, BINARY)
    );
    println!(
        "  {} {:.1}s ({:.0} files/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );
    if stats.unreadable > 0 || stats.failed > 0 {
        println!(
            "  {} {}",
            style("Unreadable:").yellow().bold(),
            format_number(stats.unreadable + stats.failed)
        );
    }
    if stats.oversized_skipped > 0 {
        println!(
            "  {} {}",
            style("Oversized skipped:").yellow().bold(),
            format_number(stats.oversized_skipped)
        );
    }

    println!(
        "  {} {}",
        style("Matched:").bold(),
        format_number(report.matched_count() as u64)
    );
    let relocation = &report.relocation;
    let moved_label = if relocation.dry_run {
        "Would move:"
    } else {
        "Moved:"
    };
    println!(
        "  {} {} -> {}",
        style(moved_label).bold(),
        format_number(relocation.moved_count() as u64),
        relocation.target.display()
    );
    if !relocation.is_clean() {
        println!(
            "  {} {}",
            style("Move failures:").red().bold(),
            format_number(relocation.failure_count() as u64)
        );
        for failure in &relocation.failures {
            println!("    {}", style(failure).red());
        }
    }
    println!();
}
