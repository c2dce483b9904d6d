//! Console and JSON output for CLI commands.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use stl2step_batch::{BatchReport, BatchReporter};
use stl2step_core::{AppError, ConversionOutcome};
use tabled::{Table, Tabled};

/// Width of the banner rules.
const RULE_WIDTH: usize = 60;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable console output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Print a list of rows in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat, empty: &str) {
    match format {
        OutputFormat::Text => {
            if items.is_empty() {
                println!("{}", empty);
            } else {
                println!("{}", Table::new(items));
            }
        }
        OutputFormat::Json => print_json(&items),
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    println!("{}", json);
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {}", msg);
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<20} {}", format!("{}:", key), value);
}

/// Print a horizontal rule
pub fn print_rule() {
    println!("{}", "=".repeat(RULE_WIDTH));
}

/// Banner printed before a batch starts
pub fn print_banner() {
    print_rule();
    println!("STL to STEP Converter");
    print_rule();
}

/// Format a byte count for tables
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Prints batch progress as plain console lines.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    removal_started: AtomicBool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Separate the removal lines from the conversion lines once.
    fn start_removals(&self) {
        if !self.removal_started.swap(true, Ordering::Relaxed) {
            println!();
        }
    }
}

impl BatchReporter for ConsoleReporter {
    fn discovered(&self, input_dir: &Path, files: &[String]) {
        if files.is_empty() {
            println!();
            println!("No STL files found in: {}", input_dir.display());
            println!("Please place your .stl files in the '{}' directory.", dir_label(input_dir));
            print_rule();
            return;
        }

        println!();
        println!("Found {} STL file(s) to process:", files.len());
        for name in files {
            println!("  - {}", name);
        }
        println!();
    }

    fn converting(&self, input_name: &str) {
        println!("Converting: {}", input_name);
    }

    fn converted(&self, _input_name: &str, output_name: &str, _outcome: &ConversionOutcome) {
        println!("  -> Created: {}", output_name);
    }

    fn conversion_failed(&self, input_name: &str, error: &AppError) {
        println!("  ERROR converting {}: {}", input_name, error.message);
    }

    fn removed(&self, input_name: &str) {
        self.start_removals();
        println!("Removed: {}", input_name);
    }

    fn removal_failed(&self, input_name: &str, error: &std::io::Error) {
        self.start_removals();
        println!("Warning: Could not remove {}: {}", input_name, error);
    }

    fn finished(&self, report: &BatchReport) {
        if !self.removal_started.load(Ordering::Relaxed) {
            println!();
        }
        println!();
        print_rule();
        println!("Conversion complete!");
        println!("  Successful: {}", report.successful());
        println!("  Failed: {}", report.failed());
        println!("  Output directory: {}", report.output_dir.display());
        print_rule();
    }
}

fn dir_label(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}
