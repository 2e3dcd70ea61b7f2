use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Counters shared by all copy workers of one run.
#[derive(Debug)]
pub struct Statistics {
    pub files_matched: AtomicUsize,
    pub files_copied: AtomicUsize,
    pub bytes_copied: AtomicU64,
    pub dirs_created: AtomicUsize,
    pub files_failed: AtomicUsize,
}

impl Default for Statistics {
    fn default() -> Self {
        Statistics {
            files_matched: AtomicUsize::new(0),
            files_copied: AtomicUsize::new(0),
            bytes_copied: AtomicU64::new(0),
            dirs_created: AtomicUsize::new(0),
            files_failed: AtomicUsize::new(0),
        }
    }
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_files_matched(&self, count: usize) {
        self.files_matched.store(count, Ordering::Relaxed);
    }

    /// Record a finished file and return how many are done so far.
    pub fn add_file_copied(&self, bytes: u64) -> usize {
        self.bytes_copied.fetch_add(bytes, Ordering::Relaxed);
        self.files_copied.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn add_dir_created(&self) {
        self.dirs_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_file_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn files_matched(&self) -> usize {
        self.files_matched.load(Ordering::Relaxed)
    }

    pub fn files_failed(&self) -> usize {
        self.files_failed.load(Ordering::Relaxed)
    }

    pub fn files_copied(&self) -> usize {
        self.files_copied.load(Ordering::Relaxed)
    }

    pub fn bytes_copied(&self) -> u64 {
        self.bytes_copied.load(Ordering::Relaxed)
    }

    pub fn outcome(&self, dry_run: bool, elapsed: Duration) -> CopyOutcome {
        CopyOutcome {
            files_matched: self.files_matched(),
            files_copied: self.files_copied(),
            bytes_copied: self.bytes_copied(),
            dry_run,
            elapsed,
        }
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Statistics:")?;
        writeln!(f, "    Files matched:       {}", self.files_matched())?;
        writeln!(f, "    Files copied:        {}", self.files_copied())?;
        writeln!(f, "    Bytes copied:        {}", self.bytes_copied())?;
        writeln!(
            f,
            "    Directories created: {}",
            self.dirs_created.load(Ordering::Relaxed)
        )?;
        writeln!(f, "    Files failed:        {}", self.files_failed())
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutcome {
    pub files_matched: usize,
    /// Files written, or that would be written in a dry run.
    pub files_copied: usize,
    pub bytes_copied: u64,
    pub dry_run: bool,
    pub elapsed: Duration,
}
