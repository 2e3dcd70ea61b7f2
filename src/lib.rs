//! cpglob - copy files matched by glob patterns
//!
//! This library provides the copy engine behind the `cpglob` binary:
//! glob matching, destination path resolution (`flat`, `up`, `*` patterns,
//! rename hooks) and concurrent per-file copying.

pub mod args;
pub mod copy;
pub mod destination;
pub mod error;
pub mod matcher;
pub mod stats;
pub mod utils;

mod engine;
mod progress;

pub use args::{CopyOptions, CopyRequest, RenameHook, UpLevels};
pub use destination::{DestinationPlan, DestinationResolver};
pub use engine::{CopyEngine, copy_files, copy_files_with_callback};
pub use error::CopyError;
pub use matcher::FileMatcher;
pub use progress::{
    CliProgress, NullProgress, ProgressCallback, ProgressInfo, ProgressState, SharedProgress,
};
pub use stats::{CopyOutcome, Statistics};
