use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::CopyError;

/// Create `dir` and any missing parents. Returns `true` if anything was created.
pub fn ensure_dir(dir: &Path) -> io::Result<bool> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(false);
    }
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(true),
        // lost a race with another worker creating the same tree
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '\\']) => rest,
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(path),
    }
}

/// Resolve a relative `path` against `cwd` when one is configured.
pub fn rebase(cwd: Option<&Path>, path: &Path) -> PathBuf {
    match cwd {
        Some(cwd) if path.is_relative() => cwd.join(path),
        _ => path.to_path_buf(),
    }
}

/// Whether `s` contains glob syntax.
pub fn has_magic(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// Lexically normalize a relative directory into its segments.
///
/// `.` segments disappear and `..` cancels the preceding segment when there is
/// one. Root and prefix components are dropped so the result can be re-rooted
/// under a destination.
fn segments(dir: &Path) -> Vec<Component<'_>> {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in dir.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                _ => out.push(component),
            },
            Component::Normal(_) => out.push(component),
        }
    }
    out
}

/// Relative form of `dir` suitable for joining under a destination.
pub fn relative_dir(dir: &Path) -> PathBuf {
    segments(dir).iter().collect()
}

/// Remove `levels` leading segments from `dir`.
pub fn strip_levels(dir: &Path, levels: usize) -> Result<PathBuf, CopyError> {
    if levels == 0 {
        return Ok(relative_dir(dir));
    }
    let parts = segments(dir);
    // the working directory itself counts as the single level `.`
    if parts.is_empty() {
        return match levels {
            1 => Ok(PathBuf::new()),
            _ => Err(CopyError::Depth {
                levels,
                path: ".".to_string(),
                actual: 1,
            }),
        };
    }
    if parts.len() < levels {
        return Err(CopyError::Depth {
            levels,
            path: to_posix(dir),
            actual: parts.len(),
        });
    }
    Ok(parts[levels..].iter().collect())
}

/// Render a path with `/` separators for reports.
pub fn to_posix(path: &Path) -> String {
    let text = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        text.into_owned()
    } else {
        text.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

/// True when any component of `path` is a dot-file or dot-directory.
pub fn is_dot_path(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}
