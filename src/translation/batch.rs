/*!
 * Batch translation of documents.
 *
 * Files matching a glob are planned (target exists or not), then translated
 * in fixed-size groups of `concurrency` files. Each group runs concurrently;
 * a failed file is counted and logged and never stops the run.
 */

use anyhow::Result;
use futures::future::join_all;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::app_config::clamp_concurrency;
use crate::errors::TranslationError;
use crate::file_utils::{FileManager, GlobPattern, PathMapper};
use crate::translation::document::{TranslationOutcome, TranslationTier};
use crate::translation::orchestrator::FallbackOrchestrator;

/// One source file and where its translation goes, both relative to the docs root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub source: PathBuf,
    pub target: PathBuf,
    pub target_exists: bool,
}

/// Files split by whether they will be translated
#[derive(Debug, Clone, Default)]
pub struct BatchPlan {
    pub to_translate: Vec<FileTask>,
    pub skipped: Vec<FileTask>,
}

impl BatchPlan {
    pub fn total(&self) -> usize {
        self.to_translate.len() + self.skipped.len()
    }
}

/// Per-file state: `Pending -> Translating -> {Succeeded, Failed}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Pending,
    Translating,
    Succeeded,
    Failed(String),
}

/// Files of one run with their counters
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub files: Vec<FileTask>,
    pub concurrency: usize,
    pub completed: usize,
    pub failed: usize,
    pub peak_in_flight: usize,
    statuses: Vec<FileStatus>,
}

impl BatchJob {
    pub fn new(files: Vec<FileTask>, concurrency: usize) -> Self {
        Self {
            statuses: vec![FileStatus::Pending; files.len()],
            files,
            concurrency: clamp_concurrency(concurrency),
            completed: 0,
            failed: 0,
            peak_in_flight: 0,
        }
    }

    pub fn status(&self, index: usize) -> Option<&FileStatus> {
        self.statuses.get(index)
    }

    fn set_status(&mut self, index: usize, status: FileStatus) {
        if let Some(slot) = self.statuses.get_mut(index) {
            *slot = status;
        }
    }
}

/// Outcome of one file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub task: FileTask,
    pub status: FileStatus,
    pub tier: Option<TranslationTier>,
}

/// Aggregated result of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub peak_in_flight: usize,
    pub reports: Vec<FileReport>,
}

/// Drives a batch of documents through the orchestrator
#[derive(Debug, Clone)]
pub struct BatchDriver {
    root: PathBuf,
    orchestrator: FallbackOrchestrator,
    mapper: PathMapper,
}

impl BatchDriver {
    pub fn new<P: AsRef<Path>>(root: P, orchestrator: FallbackOrchestrator, mapper: PathMapper) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            orchestrator,
            mapper,
        }
    }

    /// Enumerate matching files and decide which ones to translate
    pub fn plan(&self, pattern: &str, force: bool) -> Result<BatchPlan> {
        let glob = GlobPattern::new(pattern)?;
        let sources = FileManager::find_matching_files(&self.root, &glob)?;
        let mut plan = BatchPlan::default();

        for source in sources {
            let target = match self.mapper.to_target(&source) {
                Ok(target) => target,
                Err(e) => {
                    warn!("Ignoring {}: {}", source.display(), e);
                    continue;
                }
            };

            let target_exists = FileManager::file_exists(self.root.join(&target));
            let task = FileTask {
                source,
                target,
                target_exists,
            };

            if target_exists && !force {
                plan.skipped.push(task);
            } else {
                plan.to_translate.push(task);
            }
        }

        Ok(plan)
    }

    /// Plan and translate everything matching `pattern`
    pub async fn run(&self, pattern: &str, force: bool, concurrency: usize) -> Result<BatchSummary> {
        self.run_with_progress(pattern, force, concurrency, |_, _| {}).await
    }

    /// Same as `run`, reporting `(done, total)` after each file
    pub async fn run_with_progress(
        &self,
        pattern: &str,
        force: bool,
        concurrency: usize,
        progress_callback: impl Fn(usize, usize),
    ) -> Result<BatchSummary> {
        let plan = self.plan(pattern, force)?;
        Ok(self.run_plan(plan, concurrency, progress_callback).await)
    }

    /// Translate an existing plan
    pub async fn run_plan(
        &self,
        plan: BatchPlan,
        concurrency: usize,
        progress_callback: impl Fn(usize, usize),
    ) -> BatchSummary {
        let skipped = plan.skipped.len();
        let mut job = BatchJob::new(plan.to_translate, concurrency);
        let total = job.files.len();

        info!("Translating {} files, {} at a time ({} skipped)", total, job.concurrency, skipped);

        let in_flight = &AtomicUsize::new(0);
        let peak = &AtomicUsize::new(0);
        let done = &AtomicUsize::new(0);
        let progress_callback = &progress_callback;
        let mut reports = Vec::with_capacity(total);

        let mut start = 0;
        while start < total {
            let end = (start + job.concurrency).min(total);
            for index in start..end {
                job.set_status(index, FileStatus::Translating);
            }

            let group = job.files[start..end].to_vec();
            let results = join_all(group.iter().map(|task| async move {
                let running = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(running, Ordering::SeqCst);

                let result = self.translate_task(task).await;

                in_flight.fetch_sub(1, Ordering::SeqCst);
                let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                progress_callback(finished, total);
                result
            }))
            .await;

            for (offset, (task, result)) in group.into_iter().zip(results).enumerate() {
                let (status, tier) = match result {
                    Ok(outcome) => {
                        job.completed += 1;
                        (FileStatus::Succeeded, Some(outcome.tier))
                    }
                    Err(e) => {
                        error!("Failed to translate {}: {}", task.source.display(), e);
                        job.failed += 1;
                        (FileStatus::Failed(e.to_string()), None)
                    }
                };
                job.set_status(start + offset, status.clone());
                reports.push(FileReport { task, status, tier });
            }

            start = end;
        }

        job.peak_in_flight = peak.load(Ordering::SeqCst);

        BatchSummary {
            completed: job.completed,
            failed: job.failed,
            skipped,
            peak_in_flight: job.peak_in_flight,
            reports,
        }
    }

    async fn translate_task(&self, task: &FileTask) -> Result<TranslationOutcome, TranslationError> {
        self.orchestrator
            .translate_file(self.root.join(&task.source), self.root.join(&task.target))
            .await
    }
}
