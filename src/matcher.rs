//! Glob expansion of source patterns into a set of files.
//!
//! Each wildcard pattern is walked from its longest literal prefix with
//! `walkdir` and every file is tested against the compiled `glob::Pattern`.
//! Literal sources are taken as-is (files) or expanded to everything beneath
//! them (directories).

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

use crate::args::CopyOptions;
use crate::error::CopyError;
use crate::utils::{has_magic, is_dot_path, rebase};

/// Excludes applied when the caller supplies none.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/.git/**",
    "**/.svn/**",
    "**/.hg/**",
    "**/node_modules/**",
];

pub struct FileMatcher {
    excludes: Vec<Pattern>,
    all: bool,
    follow: bool,
    cwd: Option<PathBuf>,
}

impl FileMatcher {
    pub fn new(options: &CopyOptions) -> Result<Self, CopyError> {
        let raw: Vec<&str> = if options.exclude.is_empty() {
            DEFAULT_EXCLUDES.to_vec()
        } else {
            options.exclude.iter().map(String::as_str).collect()
        };
        let excludes = raw
            .into_iter()
            .map(compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            excludes,
            all: options.all,
            follow: options.follow,
            cwd: options.cwd.clone(),
        })
    }

    /// Expand every source pattern and union the results.
    pub fn find(&self, sources: &[String]) -> Result<BTreeSet<PathBuf>, CopyError> {
        let mut found = BTreeSet::new();
        for source in sources {
            self.expand(source, &mut found)?;
            if self.all {
                if let Some(dotted) = dot_variant(source) {
                    self.expand(&dotted, &mut found)?;
                }
            }
        }
        Ok(found)
    }

    fn match_options(&self) -> MatchOptions {
        MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: !self.all,
        }
    }

    fn on_disk(&self, path: &Path) -> PathBuf {
        rebase(self.cwd.as_deref(), path)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        self.excludes
            .iter()
            .any(|pattern| pattern.matches_path_with(path, options))
    }

    fn expand(&self, source: &str, found: &mut BTreeSet<PathBuf>) -> Result<(), CopyError> {
        if !has_magic(source) {
            let path = PathBuf::from(source);
            let on_disk = self.on_disk(&path);
            if on_disk.is_dir() {
                let base = source.trim_end_matches(['/', '\\']);
                return self.expand(&format!("{base}/**/*"), found);
            }
            if on_disk.is_file() && !self.is_excluded(&path) {
                found.insert(path);
            }
            return Ok(());
        }

        // match against the same component form the walk produces
        let normalized: PathBuf = Path::new(source).components().collect();
        let source = normalized.to_string_lossy();
        let pattern = compile(&source)?;
        let (base, rest) = split_literal_prefix(&source);
        let root = if base.as_os_str().is_empty() {
            self.on_disk(Path::new("."))
        } else {
            self.on_disk(&base)
        };
        if !root.is_dir() {
            return Ok(());
        }

        let max_depth = if rest.iter().any(|c| c == "**") {
            usize::MAX
        } else {
            rest.len()
        };
        // skip hidden trees unless the pattern asks for them by name
        let prune_hidden = !self.all && !rest.iter().any(|c| c.starts_with('.'));

        let walker = WalkDir::new(&root)
            .follow_links(self.follow)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !(prune_hidden
                    && entry.file_type().is_dir()
                    && entry
                        .path()
                        .strip_prefix(&root)
                        .map(is_dot_path)
                        .unwrap_or(false))
            });

        let options = self.match_options();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(pattern = %source, error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !(entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())) {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&root) else {
                continue;
            };
            let candidate = base.join(rel);
            if pattern.matches_path_with(&candidate, options) && !self.is_excluded(&candidate) {
                found.insert(candidate);
            }
        }
        Ok(())
    }
}

fn compile(pattern: &str) -> Result<Pattern, CopyError> {
    Pattern::new(pattern).map_err(|e| CopyError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Split a pattern into its literal directory prefix and the remaining glob components.
fn split_literal_prefix(pattern: &str) -> (PathBuf, Vec<String>) {
    let mut base = PathBuf::new();
    let mut rest = Vec::new();
    for component in Path::new(pattern).components() {
        let text = component.as_os_str().to_string_lossy();
        if rest.is_empty() && !has_magic(&text) {
            base.push(component);
        } else if !matches!(component, Component::CurDir) {
            rest.push(text.into_owned());
        }
    }
    (base, rest)
}

/// `dir/*.txt` -> `dir/.*.txt`, so dot-files match alongside regular ones.
fn dot_variant(pattern: &str) -> Option<String> {
    let (dir, name) = match pattern.rfind(['/', '\\']) {
        Some(idx) => pattern.split_at(idx + 1),
        None => ("", pattern),
    };
    if name.starts_with('*') {
        Some(format!("{dir}.{name}"))
    } else {
        None
    }
}
