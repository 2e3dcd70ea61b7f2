use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can end a copy run.
#[derive(Error, Debug)]
pub enum CopyError {
    #[error(
        "Please make sure to provide both <inFile> and <outDirectory>, i.e.: \"cpglob <inFile> <outDirectory>\""
    )]
    MissingPaths,

    #[error("Cannot use --flat in conjunction with --up option.")]
    FlatWithUp,

    #[error("Destination pattern {0} may contain only one `*` wildcard.")]
    DestinationPattern(String),

    #[error("Invalid glob pattern {pattern}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Can't go up {levels} levels from {path} ({actual} levels).")]
    Depth {
        levels: usize,
        path: String,
        actual: usize,
    },

    /// The rename hook failed; its message is surfaced as-is.
    #[error("{message}")]
    Rename { source_path: PathBuf, message: String },

    #[error("nothing copied")]
    NothingCopied,

    /// Read/write failure from the filesystem, displayed verbatim.
    #[error("{source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CopyError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors raised while validating the request, before any I/O.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::MissingPaths
                | Self::FlatWithUp
                | Self::DestinationPattern(_)
                | Self::InvalidPattern { .. }
        )
    }
}
