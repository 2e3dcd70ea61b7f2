use std::fs;
use std::path::Path;
use std::sync::Arc;

use cpglob::{
    CopyEngine, CopyError, CopyOptions, CopyRequest, RenameHook, SharedProgress, UpLevels,
};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("input/other")).unwrap();
        Self { dir }
    }

    fn write(&self, file: &str, body: &str) {
        let path = self.dir.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn read(&self, file: &str) -> String {
        fs::read_to_string(self.dir.path().join(file)).unwrap()
    }

    fn exists(&self, file: &str) -> bool {
        self.dir.path().join(file).exists()
    }

    /// Sorted entry names of a directory, like `readdir`.
    fn list(&self, dir: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.dir.path().join(dir))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn options(&self) -> CopyOptions {
        CopyOptions {
            cwd: Some(self.dir.path().to_path_buf()),
            ..Default::default()
        }
    }

    fn run(&self, paths: &[&str], options: CopyOptions) -> Result<(), CopyError> {
        self.run_logged(paths, options).0
    }

    fn run_logged(&self, paths: &[&str], options: CopyOptions) -> (Result<(), CopyError>, Vec<String>) {
        let progress = SharedProgress::new();
        let request = CopyRequest::from_paths(paths.iter().map(|p| p.to_string()).collect(), options);
        let engine = CopyEngine::new(request, Arc::new(progress.clone()));
        let result = engine.run().map(|_| ());
        (result, progress.take_logs())
    }
}

#[test]
fn missing_destination_is_config_error() {
    let ws = Workspace::new();
    let err = ws.run(&["input/**/*.txt"], ws.options()).unwrap_err();
    assert!(err.is_config());
    assert_eq!(
        err.to_string(),
        "Please make sure to provide both <inFile> and <outDirectory>, i.e.: \"cpglob <inFile> <outDirectory>\""
    );
}

#[test]
fn flat_and_up_conflict_before_matching() {
    let ws = Workspace::new();
    ws.write("input/a.txt", "a");
    let options = CopyOptions {
        flat: true,
        up: UpLevels::Strip(2),
        ..ws.options()
    };
    let err = ws.run(&["input/**/*.txt", "output"], options).unwrap_err();
    assert_eq!(err.to_string(), "Cannot use --flat in conjunction with --up option.");
    assert!(!ws.exists("output"));
}

#[test]
fn mirrors_source_tree() {
    let ws = Workspace::new();
    ws.write("input/a.txt", "a");
    ws.write("input/b.txt", "b");
    ws.write("input/c.js", "c");
    ws.run(&["input/*.txt", "output"], ws.options()).unwrap();
    assert_eq!(ws.list("output/input"), vec!["a.txt", "b.txt"]);
    assert_eq!(ws.read("output/input/a.txt"), "a");
}

#[test]
fn exclude_patterns_drop_matches() {
    let ws = Workspace::new();
    ws.write("input/a.txt", "a");
    ws.write("input/b.txt", "b");
    ws.write("input/c.js.txt", "c");
    ws.write("input/d.ps.txt", "d");
    let options = CopyOptions {
        exclude: vec!["**/*.js.txt".into(), "**/*.ps.txt".into()],
        ..ws.options()
    };
    ws.run(&["input/*.txt", "output"], options).unwrap();
    assert_eq!(ws.list("output/input"), vec!["a.txt", "b.txt"]);
}

#[test]
fn directory_source_copies_its_contents() {
    let ws = Workspace::new();
    ws.write("input2/a.txt", "a");
    ws.write("input2/b.txt", "b");
    ws.write("input2/c.js.txt", "c");
    let options = CopyOptions {
        exclude: vec!["**/*.js.txt".into()],
        ..ws.options()
    };
    ws.run(&["input2", "output2"], options).unwrap();
    assert_eq!(ws.list("output2/input2"), vec!["a.txt", "b.txt"]);
}

#[test]
fn nothing_copied_with_error_flag() {
    let ws = Workspace::new();
    ws.write("input/.c.txt", "c");
    let options = CopyOptions {
        error: true,
        ..ws.options()
    };
    let err = ws.run(&["input/*.txt", "output"], options).unwrap_err();
    assert!(matches!(err, CopyError::NothingCopied));
    assert_eq!(err.to_string(), "nothing copied");
}

#[test]
fn nothing_copied_reports_zero_when_verbose() {
    let ws = Workspace::new();
    let options = CopyOptions {
        verbose: true,
        ..ws.options()
    };
    let (result, logs) = ws.run_logged(&["input/doesnotexist/*.txt", "output"], options);
    assert!(result.is_ok());
    assert!(logs.contains(&"Files copied:   0".to_string()));
    assert!(logs.iter().any(|l| l.starts_with("Execution time: ")));
}

#[test]
fn all_includes_dot_files() {
    let ws = Workspace::new();
    ws.write("input/a.txt", "a");
    ws.write("input/b.txt", "b");
    ws.write("input/.c.txt", "c");

    ws.run(&["input/*.txt", "output"], ws.options()).unwrap();
    assert_eq!(ws.list("output/input"), vec!["a.txt", "b.txt"]);

    let options = CopyOptions {
        all: true,
        ..ws.options()
    };
    ws.run(&["input/*.txt", "output_all"], options).unwrap();
    assert_eq!(ws.list("output_all/input"), vec![".c.txt", "a.txt", "b.txt"]);
}

#[test]
fn up_one_level() {
    let ws = Workspace::new();
    ws.write("input/a.txt", "a");
    ws.write("input/b.txt", "b");
    ws.write("input/c.js", "c");
    let options = CopyOptions {
        up: UpLevels::Strip(1),
        ..ws.options()
    };
    ws.run(&["input/*.txt", "output"], options).unwrap();
    assert_eq!(ws.list("output"), vec!["a.txt", "b.txt"]);
}

#[test]
fn up_true_flattens() {
    let ws = Workspace::new();
    ws.write("input/a.txt", "a");
    ws.write("input/b.txt", "b");
    ws.write("input/deep/d.txt", "d");
    let options = CopyOptions {
        up: UpLevels::Flatten,
        ..ws.options()
    };
    ws.run(&["input/**/*.txt", "output"], options).unwrap();
    assert_eq!(ws.list("output"), vec!["a.txt", "b.txt", "d.txt"]);
}

#[test]
fn up_two_levels() {
    let ws = Workspace::new();
    ws.write("input/other/a.txt", "a");
    ws.write("input/other/b.txt", "b");
    ws.write("input/other/c.js", "c");
    let options = CopyOptions {
        up: UpLevels::Strip(2),
        verbose: true,
        ..ws.options()
    };
    let (result, logs) = ws.run_logged(&["input/**/*.txt", "output"], options);
    result.unwrap();
    assert_eq!(ws.list("output"), vec!["a.txt", "b.txt"]);
    assert!(logs.contains(&"glob found: [input/other/a.txt, input/other/b.txt]".to_string()));
    assert!(logs.contains(&"copy: input/other/a.txt → output/a.txt".to_string()));
    assert!(logs.contains(&"Files copied:   2".to_string()));
}

#[test]
fn up_too_far_names_directory_and_depth() {
    let ws = Workspace::new();
    ws.write("input/other/a.txt", "a");
    ws.write("input/other/b.txt", "b");
    let options = CopyOptions {
        up: UpLevels::Strip(3),
        ..ws.options()
    };
    let err = ws.run(&["input/**/*.txt", "output"], options).unwrap_err();
    assert_eq!(err.to_string(), "Can't go up 3 levels from input/other (2 levels).");
}

#[test]
fn up_one_from_working_directory_lands_in_destination_root() {
    let ws = Workspace::new();
    ws.write("a.txt", "a");
    let options = CopyOptions {
        up: UpLevels::Strip(1),
        ..ws.options()
    };
    ws.run(&["*.txt", "output"], options).unwrap();
    assert_eq!(ws.list("output"), vec!["a.txt"]);

    let options = CopyOptions {
        up: UpLevels::Strip(2),
        ..ws.options()
    };
    let err = ws.run(&["*.txt", "output2"], options).unwrap_err();
    assert_eq!(err.to_string(), "Can't go up 2 levels from . (1 levels).");
}

#[test]
fn copy_onto_itself_keeps_content() {
    let ws = Workspace::new();
    ws.write("input/a.txt", "precious");
    ws.run(&["input/a.txt", "input/a.txt"], ws.options()).unwrap();
    assert_eq!(ws.read("input/a.txt"), "precious");
}

#[test]
fn parent_relative_source_resolving_back_to_itself_keeps_content() {
    let ws = Workspace::new();
    ws.write("input/a.txt", "precious");
    ws.write("work/keep", "");
    let options = CopyOptions {
        cwd: Some(ws.dir.path().join("work")),
        ..Default::default()
    };
    // ./../input/a.txt is the source again
    ws.run(&["../input/*.txt", "."], options).unwrap();
    assert_eq!(ws.read("input/a.txt"), "precious");
}

#[test]
fn flat_drops_subdirectories() {
    let ws = Workspace::new();
    ws.write("input/other/a.txt", "a");
    ws.write("input/b.txt", "b");
    ws.write("input/other/c.js", "c");
    let options = CopyOptions {
        flat: true,
        ..ws.options()
    };
    ws.run(&["input/**/*.txt", "output"], options).unwrap();
    assert_eq!(ws.list("output"), vec!["a.txt", "b.txt"]);
}

#[cfg(unix)]
#[test]
fn follow_copies_through_symlinked_directory() {
    let ws = Workspace::new();
    ws.write("input/origin/inner/a.txt", "a");
    ws.write("input/origin/inner/b.txt", "b");
    std::os::unix::fs::symlink("origin", ws.dir.path().join("input/dest")).unwrap();
    let options = CopyOptions {
        follow: true,
        up: UpLevels::Flatten,
        ..ws.options()
    };
    ws.run(&["input/dest/**/*.txt", "output"], options).unwrap();
    assert_eq!(ws.list("output"), vec!["a.txt", "b.txt"]);
}

#[test]
fn single_file_rename() {
    let ws = Workspace::new();
    ws.write("input/original.txt", "HELLO WORLD");
    ws.run(&["input/original.txt", "output/renamed.txt"], ws.options())
        .unwrap();
    assert_eq!(ws.list("output"), vec!["renamed.txt"]);
    assert_eq!(ws.read("output/renamed.txt"), "HELLO WORLD");
}

#[test]
fn single_dot_file_rename() {
    let ws = Workspace::new();
    ws.write("input/.env.production", "SOME=VALUE");
    ws.run(&["input/.env.production", "output/.env"], ws.options())
        .unwrap();
    assert_eq!(ws.read("output/.env"), "SOME=VALUE");
}

#[test]
fn wildcard_destination_mirrors_tree() {
    let ws = Workspace::new();
    ws.write("input/root.css", ".root { color: black }");
    ws.write("input/sub1/input1.css", "h1 { color: red }");
    ws.write("input/sub2/deep1/d1.css", ".d1 { color: yellow }");
    ws.run(&["input/**/*.css", "output/*.scss"], ws.options()).unwrap();
    assert_eq!(ws.read("output/input/root.scss"), ".root { color: black }");
    assert_eq!(ws.read("output/input/sub1/input1.scss"), "h1 { color: red }");
    assert_eq!(ws.read("output/input/sub2/deep1/d1.scss"), ".d1 { color: yellow }");
}

#[test]
fn wildcard_destination_flat_and_up() {
    let ws = Workspace::new();
    ws.write("input/root.css", "r");
    ws.write("input/sub1/input1.css", "1");
    ws.write("input/sub2/deep1/d1.css", "d");

    let flat = CopyOptions {
        flat: true,
        ..ws.options()
    };
    ws.run(&["input/**/*.css", "flat/*.scss"], flat).unwrap();
    assert_eq!(ws.list("flat"), vec!["d1.scss", "input1.scss", "root.scss"]);

    let up = CopyOptions {
        up: UpLevels::Strip(1),
        ..ws.options()
    };
    ws.run(&["input/**/*.css", "up/*.scss"], up).unwrap();
    assert_eq!(ws.read("up/root.scss"), "r");
    assert_eq!(ws.read("up/sub1/input1.scss"), "1");
    assert_eq!(ws.read("up/sub2/deep1/d1.scss"), "d");
}

#[test]
fn wildcard_destination_extension_fallback() {
    let ws = Workspace::new();
    ws.write("input/file", "abc");
    ws.run(&["input/file", "with_ext/*.txt"], ws.options()).unwrap();
    assert_eq!(ws.read("with_ext/input/file.txt"), "abc");

    ws.run(&["input/file", "bare/*"], ws.options()).unwrap();
    assert_eq!(ws.read("bare/input/file"), "abc");
}

#[test]
fn rename_hook_rewrites_destination() {
    let ws = Workspace::new();
    ws.write("input/root.css", "r");
    ws.write("input/sub1/input1.css", "1");
    let options = CopyOptions {
        up: UpLevels::Strip(1),
        rename: Some(RenameHook::new(|_src, dest| {
            let name = dest.file_name().unwrap_or_default().to_string_lossy();
            Ok(dest.with_file_name(format!("renamed-{name}")))
        })),
        ..ws.options()
    };
    ws.run(&["input/**/*.css", "output"], options).unwrap();
    assert_eq!(ws.read("output/renamed-root.css"), "r");
    assert_eq!(ws.read("output/sub1/renamed-input1.css"), "1");
}

#[test]
fn rename_hook_can_move_into_subdirectory() {
    let ws = Workspace::new();
    ws.write("input/a.txt", "a");
    ws.write("input/b.txt", "b");
    let options = CopyOptions {
        rename: Some(RenameHook::new(|_src, dest| {
            Ok(Path::new("output/renamed").join(dest.strip_prefix("output")?))
        })),
        ..ws.options()
    };
    ws.run(&["input/*.txt", "output"], options).unwrap();
    assert_eq!(ws.read("output/renamed/input/a.txt"), "a");
    assert_eq!(ws.read("output/renamed/input/b.txt"), "b");
}

#[test]
fn rename_hook_with_wildcard_destination() {
    let ws = Workspace::new();
    ws.write("input/foo.css", "foo");
    ws.write("input/sub/bar.css", "bar");
    let options = CopyOptions {
        rename: Some(RenameHook::new(|_src, dest| {
            Ok(if dest.ends_with("foo.scss") {
                dest.with_file_name("baz.scss")
            } else {
                dest.to_path_buf()
            })
        })),
        ..ws.options()
    };
    ws.run(&["input/**/*.css", "output/*.scss"], options).unwrap();
    assert_eq!(ws.read("output/input/baz.scss"), "foo");
    assert_eq!(ws.read("output/input/sub/bar.scss"), "bar");
}

#[test]
fn rename_hook_error_is_run_error() {
    let ws = Workspace::new();
    ws.write("input/a.txt", "a");
    let options = CopyOptions {
        rename: Some(RenameHook::new(|_, _| Err("rename failed".into()))),
        ..ws.options()
    };
    let err = ws.run(&["input/a.txt", "output"], options).unwrap_err();
    assert_eq!(err.to_string(), "rename failed");
    assert!(!ws.exists("output/input/a.txt"));
}

#[cfg(unix)]
#[test]
fn write_failure_surfaces_io_error() {
    let ws = Workspace::new();
    ws.write("input/a.txt", "a");
    // a file where the destination sub-directory must go
    ws.write("output/input", "blocker");
    let err = ws.run(&["input/a.txt", "output"], ws.options()).unwrap_err();
    assert!(matches!(err, CopyError::Io { .. }));
}

#[test]
fn dry_run_only_reports() {
    let ws = Workspace::new();
    ws.write("input/a.txt", "a");
    ws.write("input/other/c.js", "c");
    let options = CopyOptions {
        dry_run: true,
        ..ws.options()
    };
    let (result, logs) = ws.run_logged(&["input/**/*", "output"], options);
    result.unwrap();
    assert!(logs.contains(&"=== dry-run ===".to_string()));
    assert!(logs.contains(&"copy: input/a.txt → output/input/a.txt".to_string()));
    assert!(logs.contains(&"copy: input/other/c.js → output/input/other/c.js".to_string()));
    assert!(!ws.exists("output"));
}

#[test]
fn rerun_overwrites_with_same_result() {
    let ws = Workspace::new();
    ws.write("input/a.txt", "a");
    ws.write("input/other/b.txt", "b");
    ws.run(&["input/**/*.txt", "output"], ws.options()).unwrap();
    ws.run(&["input/**/*.txt", "output"], ws.options()).unwrap();
    assert_eq!(ws.list("output/input"), vec!["a.txt", "other"]);
    assert_eq!(ws.read("output/input/other/b.txt"), "b");
}

#[test]
fn parallel_and_sequential_agree() {
    let ws = Workspace::new();
    for i in 0..40 {
        ws.write(&format!("input/d{}/f{i}.txt", i % 4), &i.to_string());
    }
    for (dest, threads) in [("seq", 1), ("par", 4)] {
        let options = CopyOptions {
            threads,
            ..ws.options()
        };
        ws.run(&["input/**/*.txt", dest], options).unwrap();
    }
    for i in 0..40 {
        let rel = format!("input/d{}/f{i}.txt", i % 4);
        assert_eq!(ws.read(&format!("seq/{rel}")), ws.read(&format!("par/{rel}")));
    }
}
