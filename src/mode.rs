//! Execution modes.

use std::fmt;
use std::str::FromStr;

/// The execution policy for a run. Chosen once at start, constant afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutionMode {
    /// Move misplaced files, never overwrite.
    #[default]
    Normal,
    /// Move misplaced files, overwrite duplicates.
    Overwrite,
    /// Flatten every component folder first, then behave like `Normal`.
    Clean,
    /// Flatten with overwrite and purge stale `_N` duplicates.
    ResetOverwrite,
}

impl ExecutionMode {
    pub const ALL: [ExecutionMode; 4] = [
        ExecutionMode::Normal,
        ExecutionMode::Overwrite,
        ExecutionMode::Clean,
        ExecutionMode::ResetOverwrite,
    ];

    /// Menu number (1-4).
    pub fn number(self) -> u8 {
        match self {
            ExecutionMode::Normal => 1,
            ExecutionMode::Overwrite => 2,
            ExecutionMode::Clean => 3,
            ExecutionMode::ResetOverwrite => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.number() == n)
    }

    pub fn name(self) -> &'static str {
        match self {
            ExecutionMode::Normal => "normal",
            ExecutionMode::Overwrite => "overwrite",
            ExecutionMode::Clean => "clean",
            ExecutionMode::ResetOverwrite => "reset-overwrite",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ExecutionMode::Normal => {
                "Normal Mode: move misplaced files without overwriting anything (first-time setup)"
            }
            ExecutionMode::Overwrite => {
                "Overwrite Mode: move misplaced files and overwrite duplicates (replace old files with new ones)"
            }
            ExecutionMode::Clean => {
                "Cleanup + Normal Mode: flatten all subfolders in each component folder before organizing (update an old structure)"
            }
            ExecutionMode::ResetOverwrite => {
                "Reset + Overwrite Mode: like cleanup, but overwrite duplicates and drop stale suffixed copies"
            }
        }
    }

    /// Whether a name collision may overwrite the existing file.
    pub fn allows_overwrite(self) -> bool {
        matches!(self, ExecutionMode::Overwrite | ExecutionMode::ResetOverwrite)
    }

    /// Whether component folders are flattened before sorting.
    pub fn flattens(self) -> bool {
        matches!(self, ExecutionMode::Clean | ExecutionMode::ResetOverwrite)
    }

    /// Whether a nested file is left in place when the root directory holds
    /// a file of the same name.
    pub fn skips_root_conflicts(self) -> bool {
        self == ExecutionMode::Clean
    }

    /// Whether collision resolution deletes existing `_N` copies and reuses
    /// the unsuffixed name.
    pub fn purges_suffixed(self) -> bool {
        self == ExecutionMode::ResetOverwrite
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.name())
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<u8>() {
            return Self::from_number(n).ok_or_else(|| format!("mode must be 1-4, got {}", n));
        }
        let lowered = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == lowered)
            .ok_or_else(|| {
                format!(
                    "unknown mode '{}', expected 1-4 or normal, overwrite, clean, reset-overwrite",
                    s
                )
            })
    }
}
