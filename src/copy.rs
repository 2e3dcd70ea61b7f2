use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::OnceLock;

use crate::error::CopyError;

const BUFFER_SIZE: usize = 64 * 1024;

/// Stream `src_path` into `dst_path`, returning the number of bytes written.
///
/// The destination is created or truncated. Read failures are attributed to
/// the source path and write failures to the destination path. Copying a
/// file onto itself leaves it untouched.
pub fn copy_file_content(src_path: &Path, dst_path: &Path) -> Result<u64, CopyError> {
    if is_same_file(src_path, dst_path) {
        let len = fs::metadata(src_path)
            .map_err(|e| CopyError::io(src_path, e))?
            .len();
        tracing::debug!(path = %src_path.display(), "source and destination are the same file");
        return Ok(len);
    }

    let mut src_file = File::open(src_path).map_err(|e| CopyError::io(src_path, e))?;
    let mut dst_file = File::create(dst_path).map_err(|e| CopyError::io(dst_path, e))?;

    let mut buffer = vec![0; BUFFER_SIZE];
    let mut bytes_copied: u64 = 0;

    loop {
        let bytes_read = src_file
            .read(&mut buffer)
            .map_err(|e| CopyError::io(src_path, e))?;
        if bytes_read == 0 {
            break;
        }

        dst_file
            .write_all(&buffer[..bytes_read])
            .map_err(|e| CopyError::io(dst_path, e))?;
        bytes_copied += bytes_read as u64;
    }

    dst_file.flush().map_err(|e| CopyError::io(dst_path, e))?;
    Ok(bytes_copied)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// One-shot slot for the first error of a run. Later errors are dropped.
#[derive(Debug, Default)]
pub struct ErrorLatch {
    first: OnceLock<CopyError>,
}

impl ErrorLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `err` if nothing was stored yet. Returns whether it won.
    pub fn record(&self, err: CopyError) -> bool {
        self.first.set(err).is_ok()
    }

    pub fn is_set(&self) -> bool {
        self.first.get().is_some()
    }

    pub fn into_inner(self) -> Option<CopyError> {
        self.first.into_inner()
    }
}
