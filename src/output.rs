//! Output formatting and styling module.
//!
//! Everything the operator reads outside the log stream goes through
//! [`OutputFormatter`]: the mode menu, the confirmation banner and the
//! final summary.

use crate::fixer::RunStats;
use crate::mode::ExecutionMode;
use colored::*;
use std::io::{self, Write};
use std::path::Path;

const RULE_WIDTH: usize = 80;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use folderfix::output::OutputFormatter;
    /// OutputFormatter::success("Process completed!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    pub fn rule() -> String {
        "=".repeat(RULE_WIDTH)
    }

    /// Writes the numbered mode menu.
    pub fn mode_menu<W: Write>(out: &mut W) -> io::Result<()> {
        writeln!(out, "\n{}", Self::rule())?;
        writeln!(out, "{}", "folderfix - Mode Selection".bold())?;
        writeln!(out, "{}", Self::rule())?;
        writeln!(out, "Choose a mode:")?;
        for mode in ExecutionMode::ALL {
            writeln!(out, "{} - {}", mode.number(), mode.description())?;
        }
        writeln!(out, "{}", Self::rule())
    }

    /// Writes the warning shown before any change is made.
    pub fn confirmation_banner<W: Write>(
        out: &mut W,
        root: &Path,
        mode: ExecutionMode,
        dry_run: bool,
    ) -> io::Result<()> {
        let dry_run_text = if dry_run {
            " (DRY RUN - No files will be modified)"
        } else {
            ""
        };
        writeln!(out, "\n{}", Self::rule())?;
        writeln!(
            out,
            "{} This will organize files in {}{}",
            "⚠  WARNING:".yellow().bold(),
            root.display(),
            dry_run_text
        )?;
        writeln!(out, "Mode: {} - {}", mode.number(), mode.description())?;
        writeln!(out, "{}", Self::rule())
    }

    /// Label/value rows of the final summary, in display order.
    ///
    /// The cleanup rows only appear when the flatten phase did something.
    pub fn summary_rows(stats: &RunStats, mode: ExecutionMode) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Mode executed", format!("{} - {}", mode.number(), mode.name())),
            ("Files moved", stats.moved.to_string()),
            ("Files skipped", stats.skipped.to_string()),
            ("Files unmatched", stats.unmatched.to_string()),
            ("Move failures", stats.failed.to_string()),
            ("Folders created", stats.folders_created.to_string()),
        ];
        if stats.cleanup_moved > 0 || stats.folders_cleaned > 0 {
            rows.push(("Cleanup files moved", stats.cleanup_moved.to_string()));
            rows.push(("Folders cleaned", stats.folders_cleaned.to_string()));
        }
        rows.push(("Duration", stats.duration_display()));
        rows
    }

    /// Prints the end-of-run summary table.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use folderfix::fixer::RunStats;
    /// use folderfix::mode::ExecutionMode;
    /// use folderfix::output::OutputFormatter;
    /// use std::path::Path;
    ///
    /// let stats = RunStats { moved: 12, unmatched: 2, ..Default::default() };
    /// OutputFormatter::summary(&stats, ExecutionMode::Normal, false, Path::new("folderfix_log.txt"));
    /// ```
    pub fn summary(stats: &RunStats, mode: ExecutionMode, dry_run: bool, log_path: &Path) {
        Self::header(if dry_run { "SUMMARY (DRY RUN)" } else { "SUMMARY" });

        let rows = Self::summary_rows(stats, mode);
        let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

        println!("{}", "-".repeat(width + 12));
        for (label, value) in &rows {
            let value = match *label {
                "Files moved" | "Cleanup files moved" => value.green(),
                "Files unmatched" | "Files skipped" if value != "0" => value.yellow(),
                "Move failures" if value != "0" => value.red().bold(),
                _ => value.normal(),
            };
            println!("{:<width$} | {}", label, value, width = width);
        }
        println!("{}", "-".repeat(width + 12));

        if dry_run {
            Self::dry_run_notice("No files were modified.");
        }
        if stats.failed > 0 {
            Self::warning("Some files could not be moved. Please review the log.");
        }
        Self::success(&format!("Detailed log written to {}", log_path.display()));
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}
