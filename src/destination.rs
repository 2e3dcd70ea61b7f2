//! Destination path resolution.
//!
//! Turns one matched source file into the path it is copied to, given the
//! destination argument (a directory or a pattern with a single `*`), the
//! directory layout and an optional rename hook.

use std::path::{Path, PathBuf};

use crate::args::{CopyOptions, RenameHook, UpLevels};
use crate::error::CopyError;
use crate::utils::{has_magic, relative_dir, strip_levels};

/// Where a single source file goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationPlan {
    /// Source as matched, relative to the working directory.
    pub source: PathBuf,
    /// Destination as composed, relative to the working directory.
    pub destination: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    /// Copy to the destination argument verbatim.
    File(PathBuf),
    /// `dir` plus a name template containing one `*`.
    Pattern { dir: PathBuf, template: String },
    Directory(PathBuf),
}

#[derive(Debug, Clone)]
pub struct DestinationResolver {
    target: Target,
    layout: UpLevels,
    rename: Option<RenameHook>,
}

impl DestinationResolver {
    pub fn new(destination: &Path, options: &CopyOptions, single_file: bool) -> Self {
        let text = destination.to_string_lossy();
        let target = if single_file {
            Target::File(destination.to_path_buf())
        } else if text.contains('*') {
            let (dir, template) = split_pattern(&text);
            Target::Pattern { dir, template }
        } else {
            Target::Directory(destination.to_path_buf())
        };
        Self {
            target,
            layout: options.layout(),
            rename: options.rename.clone(),
        }
    }

    /// Directory that must exist before any file is copied, if any.
    pub fn root_dir(&self) -> Option<&Path> {
        match &self.target {
            Target::File(_) => None,
            Target::Pattern { dir, .. } => Some(dir),
            Target::Directory(dir) => Some(dir),
        }
    }

    pub fn is_single_file(&self) -> bool {
        matches!(self.target, Target::File(_))
    }

    pub fn resolve(&self, source: &Path) -> Result<DestinationPlan, CopyError> {
        let computed = match &self.target {
            Target::File(path) => path.clone(),
            Target::Pattern { dir, template } => {
                self.layout_dir(dir, source)?.join(substitute(template, source))
            }
            Target::Directory(dir) => {
                let name = source.file_name().unwrap_or(source.as_os_str());
                self.layout_dir(dir, source)?.join(name)
            }
        };

        let destination = match &self.rename {
            Some(hook) => hook
                .apply(source, &computed)
                .map_err(|e| CopyError::Rename {
                    source_path: source.to_path_buf(),
                    message: e.to_string(),
                })?,
            None => computed,
        };

        tracing::debug!(
            source = %source.display(),
            destination = %destination.display(),
            "resolved destination"
        );
        Ok(DestinationPlan {
            source: source.to_path_buf(),
            destination,
        })
    }

    fn layout_dir(&self, dir: &Path, source: &Path) -> Result<PathBuf, CopyError> {
        let source_dir = source.parent().unwrap_or(Path::new(""));
        Ok(match self.layout {
            UpLevels::Flatten => dir.to_path_buf(),
            UpLevels::Strip(n) if n > 0 => dir.join(strip_levels(source_dir, n)?),
            UpLevels::Strip(_) | UpLevels::FullTree => dir.join(relative_dir(source_dir)),
        })
    }
}

/// Split `out/sub/*.scss` into (`out/sub`, `*.scss`).
fn split_pattern(destination: &str) -> (PathBuf, String) {
    let star = destination.find('*').unwrap_or(0);
    match destination[..star].rfind(['/', '\\']) {
        Some(sep) => (
            PathBuf::from(&destination[..sep]),
            destination[sep + 1..].to_string(),
        ),
        None => (PathBuf::new(), destination.to_string()),
    }
}

/// Fill a `*` name template from the source file name.
///
/// The star takes the source's stem. When the template carries no extension
/// of its own, the source's extension is kept.
fn substitute(template: &str, source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = template.replacen('*', &stem, 1);

    let suffix = template.split_once('*').map_or("", |(_, after)| after);
    if suffix.rfind('.').is_some_and(|dot| dot + 1 < suffix.len()) {
        return name;
    }
    match source.extension() {
        Some(ext) => format!("{name}.{}", ext.to_string_lossy()),
        None => name,
    }
}

/// Whether a request is a plain `file -> new file name` copy.
///
/// Requires a single literal source that is not a directory, and a literal
/// destination that names a file: an existing non-directory, or a missing path
/// with an extension or a dot-file name.
pub fn is_single_file_rename(sources: &[String], source_on_disk: &Path, destination: &Path) -> bool {
    let [source] = sources else {
        return false;
    };
    if has_magic(source) || source_on_disk.is_dir() {
        return false;
    }
    if destination.to_string_lossy().contains('*') {
        return false;
    }
    match destination.metadata() {
        Ok(meta) => !meta.is_dir(),
        Err(_) => {
            let dot_name = destination
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with('.'));
            destination.extension().is_some() || dot_name
        }
    }
}
