use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::args::CopyRequest;
use crate::copy::{ErrorLatch, copy_file_content};
use crate::destination::{DestinationResolver, is_single_file_rename};
use crate::error::CopyError;
use crate::matcher::FileMatcher;
use crate::progress::{CliProgress, ProgressCallback, ProgressInfo, ProgressState};
use crate::stats::{CopyOutcome, Statistics};
use crate::utils::{ensure_dir, expand_home, rebase, to_posix};

pub struct CopyEngine {
    request: CopyRequest,
    stats: Arc<Statistics>,
    progress: Arc<dyn ProgressCallback>,
}

impl CopyEngine {
    pub fn new(request: CopyRequest, progress: Arc<dyn ProgressCallback>) -> Self {
        Self {
            request,
            stats: Arc::new(Statistics::new()),
            progress,
        }
    }

    /// Counters of the current or last run, readable after a failure too.
    pub fn stats(&self) -> Arc<Statistics> {
        self.stats.clone()
    }

    /// Validate the request and copy every matched file.
    pub fn run(&self) -> Result<CopyOutcome, CopyError> {
        self.request.validate()?;
        self.execute()
    }

    /// Like [`run`](Self::run), but hands the outcome to `callback` instead of returning it.
    pub fn run_with_callback<F>(&self, callback: F)
    where
        F: FnOnce(Option<CopyError>),
    {
        callback(self.run().err());
    }

    /// Validate on the calling thread, then copy on a background thread.
    ///
    /// Validation errors reach `callback` before this returns, and no thread
    /// is started for them.
    pub fn spawn<F>(self, callback: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce(Option<CopyError>) + Send + 'static,
    {
        if let Err(e) = self.request.validate() {
            callback(Some(e));
            return None;
        }
        Some(thread::spawn(move || callback(self.execute().err())))
    }

    fn on_disk(&self, path: &Path) -> PathBuf {
        rebase(self.request.options.cwd.as_deref(), path)
    }

    fn set_state(&self, state: ProgressState) {
        let info = ProgressInfo {
            state,
            files_done: self.stats.files_copied() as u64,
            files_total: self.stats.files_matched() as u64,
            bytes_done: self.stats.bytes_copied(),
            ..Default::default()
        };
        self.progress.on_progress(&info);
    }

    fn fail(&self, err: CopyError) -> Result<CopyOutcome, CopyError> {
        tracing::debug!(error = %err, "copy run failed");
        self.set_state(ProgressState::Failed);
        Err(err)
    }

    fn execute(&self) -> Result<CopyOutcome, CopyError> {
        let options = &self.request.options;
        let start = Instant::now();
        tracing::debug!(
            sources = ?self.request.sources,
            destination = %self.request.destination,
            flags = %options.to_string_flags(),
            "starting copy run"
        );

        let destination = expand_home(&self.request.destination);
        let single_file = match self.request.sources.first() {
            Some(first) => is_single_file_rename(
                &self.request.sources,
                &self.on_disk(Path::new(first)),
                &self.on_disk(&destination),
            ),
            None => false,
        };
        let resolver = DestinationResolver::new(&destination, options, single_file);

        if !options.dry_run {
            if let Some(root) = resolver.root_dir() {
                let root = self.on_disk(root);
                match ensure_dir(&root) {
                    Ok(true) => self.stats.add_dir_created(),
                    Ok(false) => {}
                    Err(e) => return self.fail(CopyError::io(root, e)),
                }
            }
        }

        self.set_state(ProgressState::Matching);
        let files = match FileMatcher::new(options).and_then(|m| m.find(&self.request.sources)) {
            Ok(files) => files,
            Err(e) => return self.fail(e),
        };
        self.stats.set_files_matched(files.len());

        if options.verbose {
            let listed: Vec<String> = files.iter().map(|p| to_posix(p)).collect();
            self.progress
                .on_log(&format!("glob found: [{}]", listed.join(", ")));
        }

        if files.is_empty() {
            if options.error {
                return self.fail(CopyError::NothingCopied);
            }
            return Ok(self.finish(start));
        }

        if options.dry_run {
            return self.dry_run(&resolver, &files, start);
        }
        self.copy_all(&resolver, files, start)
    }

    fn dry_run(
        &self,
        resolver: &DestinationResolver,
        files: &BTreeSet<PathBuf>,
        start: Instant,
    ) -> Result<CopyOutcome, CopyError> {
        self.progress.on_log("=== dry-run ===");
        for source in files {
            let plan = match resolver.resolve(source) {
                Ok(plan) => plan,
                Err(e) => return self.fail(e),
            };
            self.progress.on_log(&format!(
                "copy: {} → {}",
                to_posix(&plan.source),
                to_posix(&plan.destination)
            ));
            let size = fs::metadata(self.on_disk(source))
                .map(|m| m.len())
                .unwrap_or(0);
            self.stats.add_file_copied(size);
        }
        Ok(self.finish(start))
    }

    fn copy_all(
        &self,
        resolver: &DestinationResolver,
        files: BTreeSet<PathBuf>,
        start: Instant,
    ) -> Result<CopyOutcome, CopyError> {
        let files: Vec<PathBuf> = files.into_iter().collect();
        let total = files.len() as u64;
        let latch = ErrorLatch::new();
        self.set_state(ProgressState::Copying);

        let task = |source: &PathBuf| {
            if let Err(e) = self.copy_one(resolver, source, total, &latch) {
                self.stats.add_file_failed();
                tracing::debug!(source = %source.display(), error = %e, "file copy failed");
                latch.record(e);
            }
        };

        let threads = self.request.options.threads;
        if threads == 1 {
            files.iter().for_each(task);
        } else {
            match ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(|| files.par_iter().for_each(task)),
                Err(e) => {
                    tracing::warn!(error = %e, "thread pool unavailable, copying sequentially");
                    files.iter().for_each(task);
                }
            }
        }

        match latch.into_inner() {
            Some(err) => self.fail(err),
            None => Ok(self.finish(start)),
        }
    }

    fn copy_one(
        &self,
        resolver: &DestinationResolver,
        source: &Path,
        total: u64,
        latch: &ErrorLatch,
    ) -> Result<(), CopyError> {
        let plan = resolver.resolve(source)?;
        let src_path = self.on_disk(&plan.source);
        let dst_path = self.on_disk(&plan.destination);

        if let Some(parent) = dst_path.parent() {
            if ensure_dir(parent).map_err(|e| CopyError::io(parent, e))? {
                self.stats.add_dir_created();
                tracing::debug!(dir = %parent.display(), "created directory");
            }
        }

        let bytes = copy_file_content(&src_path, &dst_path)?;
        let files_done = self.stats.add_file_copied(bytes);

        // once a run has failed, remaining copies finish without reporting
        if latch.is_set() {
            return Ok(());
        }
        if self.request.options.verbose {
            self.progress.on_log(&format!(
                "copy: {} → {}",
                to_posix(&plan.source),
                to_posix(&plan.destination)
            ));
        }
        self.progress.on_progress(&ProgressInfo {
            state: ProgressState::Copying,
            current_file: to_posix(&plan.source),
            files_done: files_done as u64,
            files_total: total,
            bytes_done: self.stats.bytes_copied(),
        });
        Ok(())
    }

    fn finish(&self, start: Instant) -> CopyOutcome {
        let options = &self.request.options;
        let outcome = self.stats.outcome(options.dry_run, start.elapsed());

        if options.reports_stats() || options.dry_run {
            self.progress
                .on_log(&format!("Files copied:   {}", outcome.files_copied));
            self.progress
                .on_log(&format!("Execution time: {:.3?}", outcome.elapsed));
        }
        tracing::debug!("run finished\n{}", self.stats);
        self.set_state(ProgressState::Completed);
        outcome
    }
}

/// Copy with console reporting, returning the outcome or the first error.
pub fn copy_files(request: CopyRequest) -> Result<CopyOutcome, CopyError> {
    let progress = Arc::new(CliProgress::new(request.options.show_progress));
    CopyEngine::new(request, progress).run()
}

/// Copy with console reporting, handing any error to `callback`.
pub fn copy_files_with_callback<F>(request: CopyRequest, callback: F)
where
    F: FnOnce(Option<CopyError>),
{
    let progress = Arc::new(CliProgress::new(request.options.show_progress));
    CopyEngine::new(request, progress).run_with_callback(callback);
}
