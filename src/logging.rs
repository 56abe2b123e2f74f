//! Run logger.
//!
//! Every event becomes one line `[YYYY-MM-DD HH:MM:SS] LEVEL message`. The
//! line goes to the console with the level coloured, and is appended in
//! plain form to [`LOG_FILE_NAME`] in the log directory.

use chrono::Local;
use colored::*;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

pub const LOG_FILE_NAME: &str = "folderfix_log.txt";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to create log directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("Failed to open log file {}: {source}", path.display())]
    OpenFile { path: PathBuf, source: io::Error },
    #[error("A logger is already installed")]
    AlreadyInstalled,
}

/// Writes each record to the console and to the run's log file.
pub struct RunLogger {
    level: LevelFilter,
    file: Option<Mutex<File>>,
    console: bool,
}

impl RunLogger {
    /// Opens (or creates) the log file in append mode.
    pub fn new(log_path: &Path, level: LevelFilter) -> Result<Self, LoggingError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .map_err(|e| LoggingError::OpenFile {
                path: log_path.to_path_buf(),
                source: e,
            })?;
        Ok(Self {
            level,
            file: Some(Mutex::new(file)),
            console: true,
        })
    }

    /// A logger that only writes to the file. Used by tests.
    pub fn file_only(log_path: &Path, level: LevelFilter) -> Result<Self, LoggingError> {
        let mut logger = Self::new(log_path, level)?;
        logger.console = false;
        Ok(logger)
    }

    fn write_console(&self, level: Level, timestamp: &str, message: &str) {
        let tag = match level {
            Level::Error => "ERROR".red().bold(),
            Level::Warn => "WARN".yellow(),
            Level::Info => "INFO".cyan(),
            Level::Debug => "DEBUG".dimmed(),
            Level::Trace => "TRACE".dimmed(),
        };
        let line = format!("[{}] {} {}", timestamp.dimmed(), tag, message);
        if level <= Level::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

impl Log for RunLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let message = record.args().to_string();

        if self.console {
            self.write_console(record.level(), &timestamp, &message);
        }

        if let Some(file) = &self.file
            && let Ok(mut file) = file.lock()
        {
            // Write errors are ignored
            let _ = writeln!(file, "{}", format_line(&timestamp, record.level(), &message));
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file
            && let Ok(mut file) = file.lock()
        {
            let _ = file.flush();
        }
    }
}

/// The plain-text form of one log line.
pub fn format_line(timestamp: &str, level: Level, message: &str) -> String {
    format!("[{}] {} {}", timestamp, level, message)
}

/// Where the log file goes: `log_dir` if given, else the working directory.
pub fn log_file_path(log_dir: Option<&Path>, working_dir: &Path) -> PathBuf {
    log_dir.unwrap_or(working_dir).join(LOG_FILE_NAME)
}

/// Installs the run logger as the global `log` backend.
///
/// Creates `log_dir` if it does not exist. Returns the log file path.
pub fn init(
    log_dir: Option<&Path>,
    working_dir: &Path,
    verbose: bool,
) -> Result<PathBuf, LoggingError> {
    if let Some(dir) = log_dir {
        fs::create_dir_all(dir).map_err(|e| LoggingError::CreateDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }

    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let path = log_file_path(log_dir, working_dir);
    let logger = RunLogger::new(&path, level)?;

    log::set_boxed_logger(Box::new(logger)).map_err(|_| LoggingError::AlreadyInstalled)?;
    log::set_max_level(level);
    Ok(path)
}
