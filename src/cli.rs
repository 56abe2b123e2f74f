//! Command-line interface module for folderfix.
//!
//! Parses arguments, picks the execution mode (from flags or an interactive
//! menu), installs the run logger, loads the configuration, asks for
//! confirmation and finally drives a [`FolderFixer`] run.

use crate::config::FixerConfig;
use crate::fixer::{FolderFixer, RunStats};
use crate::logging;
use crate::mode::ExecutionMode;
use crate::output::OutputFormatter;
use anyhow::{Context, bail};
use clap::Parser;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "folderfix",
    version,
    about = "Sort production asset files into per-component folders",
    after_help = "Execution modes:\n  1 - normal           move misplaced files without overwriting\n  2 - overwrite        move misplaced files and overwrite duplicates\n  3 - clean            flatten every component folder, then sort\n  4 - reset-overwrite  like clean, overwriting and dropping stale _N copies"
)]
pub struct Args {
    /// Working directory (default: current directory)
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub path: Option<PathBuf>,

    /// Execution mode: 1-4 or normal, overwrite, clean, reset-overwrite
    #[arg(long, value_name = "MODE", group = "mode_flag")]
    pub mode: Option<ExecutionMode>,

    /// Same as --mode 2
    #[arg(long, group = "mode_flag")]
    pub overwrite: bool,

    /// Same as --mode 3
    #[arg(long, group = "mode_flag")]
    pub clean: bool,

    /// Same as --mode 4
    #[arg(long, group = "mode_flag")]
    pub reset_overwrite: bool,

    /// Log every action without touching the filesystem
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the mode menu and the confirmation prompt (mode defaults to 1)
    #[arg(long)]
    pub no_prompt: bool,

    /// Directory for folderfix_log.txt (default: working directory)
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Layout configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug-level logging
    #[arg(short, long, visible_alias = "debug")]
    pub verbose: bool,
}

impl Args {
    /// The mode named on the command line, if any.
    pub fn requested_mode(&self) -> Option<ExecutionMode> {
        if self.overwrite {
            Some(ExecutionMode::Overwrite)
        } else if self.clean {
            Some(ExecutionMode::Clean)
        } else if self.reset_overwrite {
            Some(ExecutionMode::ResetOverwrite)
        } else {
            self.mode
        }
    }

    fn working_dir(&self) -> anyhow::Result<PathBuf> {
        let dir = match &self.path {
            Some(path) => path.clone(),
            None => env::current_dir().context("Failed to read the current directory")?,
        };
        if !dir.is_dir() {
            bail!("Not a directory: {}", dir.display());
        }
        Ok(dir)
    }
}

/// Asks for a mode until a valid one is entered. `None` on end of input.
pub fn prompt_mode<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
) -> io::Result<Option<ExecutionMode>> {
    OutputFormatter::mode_menu(out)?;
    loop {
        write!(out, "Enter your choice (1-4): ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match line.trim().parse::<u8>().ok().and_then(ExecutionMode::from_number) {
            Some(mode) => return Ok(Some(mode)),
            None => writeln!(out, "Invalid choice. Please enter 1, 2, 3, or 4.")?,
        }
    }
}

/// The confirmation gate. Enter or `y` proceeds; anything else, including
/// end of input, cancels.
pub fn confirm<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    root: &Path,
    mode: ExecutionMode,
    dry_run: bool,
) -> io::Result<bool> {
    OutputFormatter::confirmation_banner(out, root, mode, dry_run)?;
    write!(out, "Press Enter to continue or type 'n' to cancel: ")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(false);
    }
    let answer = line.trim().to_lowercase();
    Ok(answer.is_empty() || answer == "y" || answer == "yes")
}

/// Picks the mode: command line first, then `--no-prompt` default, then
/// the interactive menu.
pub fn resolve_mode<R: BufRead, W: Write>(
    args: &Args,
    input: &mut R,
    out: &mut W,
) -> io::Result<Option<ExecutionMode>> {
    if let Some(mode) = args.requested_mode() {
        return Ok(Some(mode));
    }
    if args.no_prompt {
        return Ok(Some(ExecutionMode::Normal));
    }
    prompt_mode(input, out)
}

/// Runs folderfix with parsed arguments against stdin/stdout.
///
/// Returns `Ok(None)` when the operator cancels before anything changed.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use folderfix::cli::{Args, run_cli};
///
/// let args = Args::parse_from(["folderfix", "/work/assets", "--clean", "--dry-run", "--no-prompt"]);
/// match run_cli(args) {
///     Ok(Some(stats)) => println!("{} files would move", stats.moved),
///     Ok(None) => println!("Cancelled"),
///     Err(e) => eprintln!("Error: {:#}", e),
/// }
/// ```
pub fn run_cli(args: Args) -> anyhow::Result<Option<RunStats>> {
    let working_dir = args.working_dir()?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    let Some(mode) = resolve_mode(&args, &mut input, &mut out)? else {
        OutputFormatter::warning("Operation cancelled.");
        return Ok(None);
    };

    let log_path = logging::init(args.log_dir.as_deref(), &working_dir, args.verbose)
        .context("Failed to set up logging")?;

    let stats = execute(&args, &working_dir, mode, &mut input, &mut out)?;
    if let Some(stats) = &stats {
        OutputFormatter::summary(stats, mode, args.dry_run, &log_path);
    }
    Ok(stats)
}

/// Everything after mode selection and logger setup.
///
/// Loads the configuration, applies the confirmation gate (unless
/// `--no-prompt`), runs every phase and logs the final tally.
pub fn execute<R: BufRead, W: Write>(
    args: &Args,
    working_dir: &Path,
    mode: ExecutionMode,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<Option<RunStats>> {
    let dry_run_text = if args.dry_run { " (DRY RUN)" } else { "" };
    let debug_text = if args.verbose { " (DEBUG)" } else { "" };
    log::info!("folderfix v{} started", env!("CARGO_PKG_VERSION"));
    log::info!(
        "Execution mode: {} - {}{}{}",
        mode.number(),
        mode.description(),
        dry_run_text,
        debug_text
    );
    log::info!("Working directory: {}", working_dir.display());

    let rules = FixerConfig::load(args.config.as_deref(), working_dir)
        .context("Error loading configuration")?
        .compile()
        .context("Error compiling configuration")?;

    if !args.no_prompt && !confirm(input, out, working_dir, mode, args.dry_run)? {
        log::info!("Cancelled by user, no changes made");
        return Ok(None);
    }

    let fixer = FolderFixer::new(working_dir, &rules, mode, args.dry_run);
    let stats = fixer
        .run()
        .with_context(|| format!("Failed to organize {}", working_dir.display()))?;

    log::info!("Completed{}", dry_run_text);
    log::info!(
        "Summary: {} moved, {} skipped, {} unmatched, {} failed, {} folders created, {} cleanup moved, {} folders cleaned in {}",
        stats.moved,
        stats.skipped,
        stats.unmatched,
        stats.failed,
        stats.folders_created,
        stats.cleanup_moved,
        stats.folders_cleaned,
        stats.duration_display()
    );
    Ok(Some(stats))
}
