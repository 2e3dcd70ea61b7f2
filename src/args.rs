use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use clap::{ArgAction, Parser};

use crate::error::CopyError;

/// Error type a rename hook may return.
pub type RenameFailure = Box<dyn std::error::Error + Send + Sync>;

/// How much of a file's source directory is kept under the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpLevels {
    /// Mirror the full relative source directory.
    #[default]
    FullTree,
    /// Drop the source directory entirely, keeping only the file name.
    Flatten,
    /// Drop this many leading directory segments.
    Strip(usize),
}

impl UpLevels {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Strip(n) if *n > 0)
    }
}

impl FromStr for UpLevels {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "true" => Ok(Self::Flatten),
            "false" | "0" => Ok(Self::FullTree),
            n => n
                .parse::<usize>()
                .map(Self::Strip)
                .map_err(|_| format!("expected a number of levels or `true`, got `{n}`")),
        }
    }
}

/// User-supplied transform from `(source, computed destination)` to the final destination.
#[derive(Clone)]
pub struct RenameHook(
    Arc<dyn Fn(&Path, &Path) -> Result<PathBuf, RenameFailure> + Send + Sync>,
);

impl RenameHook {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Path, &Path) -> Result<PathBuf, RenameFailure> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn apply(&self, source: &Path, destination: &Path) -> Result<PathBuf, RenameFailure> {
        (self.0)(source, destination)
    }
}

impl fmt::Debug for RenameHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RenameHook(..)")
    }
}

#[derive(Debug, Clone)]
pub struct CopyOptions {
    /// Include files and directories beginning with a dot.
    pub all: bool,
    /// Report what would be copied without touching the filesystem.
    pub dry_run: bool,
    /// Fail when no file matched.
    pub error: bool,
    /// Glob patterns to exclude. Empty means the default exclude set.
    pub exclude: Vec<String>,
    /// Ignore source sub-directories.
    pub flat: bool,
    /// Follow symbolic links while matching.
    pub follow: bool,
    /// Print the file count and execution time.
    pub stat: bool,
    /// Print matched files and every copy.
    pub verbose: bool,
    pub up: UpLevels,
    pub rename: Option<RenameHook>,
    /// Directory that relative sources and destination resolve against.
    pub cwd: Option<PathBuf>,
    /// Copy workers: 0 picks the rayon default, 1 copies sequentially.
    pub threads: usize,
    pub show_progress: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        CopyOptions {
            all: false,
            dry_run: false,
            error: false,
            exclude: Vec::new(),
            flat: false,
            follow: false,
            stat: false,
            verbose: false,
            up: UpLevels::FullTree,
            rename: None,
            cwd: None,
            threads: 0,
            show_progress: false,
        }
    }
}

impl CopyOptions {
    pub fn validate(&self) -> Result<(), CopyError> {
        if self.flat && self.up.is_numeric() {
            return Err(CopyError::FlatWithUp);
        }
        Ok(())
    }

    /// Directory layout after folding `flat` into `up`.
    pub fn layout(&self) -> UpLevels {
        match self.up {
            _ if self.flat => UpLevels::Flatten,
            UpLevels::Strip(0) => UpLevels::FullTree,
            up => up,
        }
    }

    /// Whether the run reports statistics at the end.
    pub fn reports_stats(&self) -> bool {
        self.verbose || self.stat
    }

    pub fn to_string_flags(&self) -> String {
        let mut result = Vec::new();

        if self.all {
            result.push("--all".to_string());
        }
        if self.dry_run {
            result.push("--dry-run".to_string());
        }
        if self.error {
            result.push("--error".to_string());
        }
        for pattern in &self.exclude {
            result.push(format!("--exclude {}", pattern));
        }
        if self.flat {
            result.push("--flat".to_string());
        }
        if self.follow {
            result.push("--follow".to_string());
        }
        match self.up {
            UpLevels::FullTree => {}
            UpLevels::Flatten => result.push("--up true".to_string()),
            UpLevels::Strip(n) => result.push(format!("--up {}", n)),
        }
        if self.rename.is_some() {
            result.push("<rename>".to_string());
        }
        if self.threads != 0 {
            result.push(format!("--threads {}", self.threads));
        }

        result.join(" ")
    }
}

/// Sources, destination and options for one copy run.
#[derive(Debug, Clone, Default)]
pub struct CopyRequest {
    pub sources: Vec<String>,
    pub destination: String,
    pub options: CopyOptions,
}

impl CopyRequest {
    pub fn new<S: Into<String>>(
        sources: impl IntoIterator<Item = S>,
        destination: impl Into<String>,
        options: CopyOptions,
    ) -> Self {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
            destination: destination.into(),
            options,
        }
    }

    /// Split a CLI-style path list: the last entry is the destination.
    pub fn from_paths(mut paths: Vec<String>, options: CopyOptions) -> Self {
        let destination = if paths.len() >= 2 {
            paths.pop().unwrap_or_default()
        } else {
            String::new()
        };
        Self {
            sources: paths,
            destination,
            options,
        }
    }

    pub fn validate(&self) -> Result<(), CopyError> {
        if self.sources.is_empty()
            || self.sources.iter().any(|s| s.is_empty())
            || self.destination.is_empty()
        {
            return Err(CopyError::MissingPaths);
        }
        self.options.validate()?;
        if self.destination.matches('*').count() > 1 {
            return Err(CopyError::DestinationPattern(self.destination.clone()));
        }
        Ok(())
    }
}

/// Command line interface.
#[derive(Parser, Debug)]
#[command(
    name = "cpglob",
    version,
    about = "Copy files matched by glob patterns into a destination directory",
    disable_version_flag = true
)]
pub struct Cli {
    /// Source glob(s) followed by the destination directory or `*` pattern
    #[arg(value_name = "PATHS")]
    pub paths: Vec<String>,

    /// Include files & directories beginning with a dot (.)
    #[arg(short = 'a', long)]
    pub all: bool,

    /// Show what would be copied, but do not copy any files
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Fail if nothing is copied
    #[arg(short = 'E', long)]
    pub error: bool,

    /// Pattern or glob to exclude (may be passed multiple times)
    #[arg(short = 'e', long, num_args = 1.., action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Flatten the output
    #[arg(short = 'f', long)]
    pub flat: bool,

    /// Follow symbolic links
    #[arg(short = 'F', long)]
    pub follow: bool,

    /// Show statistics after execution (execution time + file count)
    #[arg(short = 's', long)]
    pub stat: bool,

    /// Slice N directory levels off the source paths (`true` flattens)
    #[arg(short = 'u', long, value_name = "N")]
    pub up: Option<UpLevels>,

    /// Print more information to the console
    #[arg(short = 'V', long)]
    pub verbose: bool,

    /// Show a running file count
    #[arg(short = 'p', long)]
    pub progress: bool,

    /// Number of copy workers (1 copies sequentially)
    #[arg(short = 'j', long, default_value_t = 0)]
    pub threads: usize,

    /// Resolve relative paths against this directory
    #[arg(short = 'C', long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,
}

impl Cli {
    pub fn into_request(self) -> CopyRequest {
        let options = CopyOptions {
            all: self.all,
            dry_run: self.dry_run,
            error: self.error,
            exclude: self.exclude,
            flat: self.flat,
            follow: self.follow,
            stat: self.stat,
            verbose: self.verbose,
            up: self.up.unwrap_or_default(),
            rename: None,
            cwd: self.cwd,
            threads: self.threads,
            show_progress: self.progress,
        };
        CopyRequest::from_paths(self.paths, options)
    }
}
