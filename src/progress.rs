//! Progress and report callbacks for the copy engine.
//!
//! The engine never prints directly; report lines and progress updates go
//! through [`ProgressCallback`] so the CLI, tests and embedders can each
//! decide what to do with them.

use std::io::Write;
use std::sync::{Arc, Mutex};

/// Current state of a copy run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    /// Not started
    Idle,
    /// Expanding source patterns
    Matching,
    /// Copying matched files
    Copying,
    /// Finished without error
    Completed,
    /// Finished with an error
    Failed,
}

/// Snapshot of a run's progress
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    pub state: ProgressState,
    /// Source path of the file that just finished
    pub current_file: String,
    pub files_done: u64,
    pub files_total: u64,
    pub bytes_done: u64,
}

impl Default for ProgressInfo {
    fn default() -> Self {
        Self {
            state: ProgressState::Idle,
            current_file: String::new(),
            files_done: 0,
            files_total: 0,
            bytes_done: 0,
        }
    }
}

impl ProgressInfo {
    /// Share of matched files done, 0-100
    pub fn percentage(&self) -> f32 {
        if self.files_total == 0 {
            0.0
        } else {
            (self.files_done as f32 / self.files_total as f32) * 100.0
        }
    }
}

/// Receives progress updates and report lines from the copy engine.
///
/// Called from copy workers, so implementations must be thread-safe.
pub trait ProgressCallback: Send + Sync {
    /// Called on state changes and after each copied file
    fn on_progress(&self, info: &ProgressInfo);

    /// Called with one report line
    fn on_log(&self, message: &str);
}

/// Discards everything.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
    fn on_log(&self, _message: &str) {}
}

/// Prints report lines to stdout.
pub struct CliProgress {
    show_progress: bool,
}

impl CliProgress {
    pub fn new(show_progress: bool) -> Self {
        Self { show_progress }
    }
}

impl ProgressCallback for CliProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if !self.show_progress {
            return;
        }

        match info.state {
            ProgressState::Matching => {
                print!("\rMatching files...");
                let _ = std::io::stdout().flush();
            }
            ProgressState::Copying => {
                print!(
                    "\r{:.0}% - {} of {} files",
                    info.percentage(),
                    info.files_done,
                    info.files_total
                );
                let _ = std::io::stdout().flush();
            }
            ProgressState::Completed | ProgressState::Failed => println!(),
            ProgressState::Idle => {}
        }
    }

    fn on_log(&self, message: &str) {
        println!("{}", message);
    }
}

/// Collects progress and report lines in memory.
#[derive(Clone, Default)]
pub struct SharedProgress {
    info: Arc<Mutex<ProgressInfo>>,
    log_messages: Arc<Mutex<Vec<String>>>,
}

impl SharedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest progress snapshot
    pub fn get_info(&self) -> ProgressInfo {
        self.info.lock().map(|i| i.clone()).unwrap_or_default()
    }

    /// Get and clear report lines
    pub fn take_logs(&self) -> Vec<String> {
        self.log_messages
            .lock()
            .map(|mut logs| std::mem::take(&mut *logs))
            .unwrap_or_default()
    }

    /// Report lines without clearing
    pub fn peek_logs(&self) -> Vec<String> {
        self.log_messages
            .lock()
            .map(|logs| logs.clone())
            .unwrap_or_default()
    }
}

impl ProgressCallback for SharedProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Ok(mut current) = self.info.lock() {
            *current = info.clone();
        }
    }

    fn on_log(&self, message: &str) {
        if let Ok(mut logs) = self.log_messages.lock() {
            logs.push(message.to_string());
        }
    }
}
