use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::{Duration, Instant};

use crate::app_config::{Config, HostedProvider};
use crate::errors::{AppError, TranslationError};
use crate::file_utils::{FileManager, PathMapper};
use crate::translation::batch::{BatchDriver, BatchSummary, FileStatus};
use crate::translation::document::TranslationTier;
use crate::translation::orchestrator::FallbackOrchestrator;
use crate::validation::{IssueKind, TranslationValidator, ValidationReport};
use crate::watcher::DocumentWatcher;

// @module: Application controller for the doctrans commands

/// Result of the `file` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SingleFileOutcome {
    Translated {
        source: PathBuf,
        target: PathBuf,
        source_bytes: u64,
        target_bytes: u64,
        tier: TranslationTier,
    },
    /// Target exists and overwriting was not requested
    Skipped { target: PathBuf },
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Docs root all relative paths start from
    root: PathBuf,
    // @field: Directory relative FILE arguments are tried against first
    working_dir: PathBuf,
    mapper: PathMapper,
    orchestrator: FallbackOrchestrator,
}

impl Controller {
    // @method: Create a controller with the backend chain built from config
    pub fn with_config<P: AsRef<Path>>(config: Config, root: P) -> Result<Self> {
        config
            .validate()
            .map_err(|e| AppError::Config(format!("{:#}", e)))?;
        let orchestrator = FallbackOrchestrator::from_config(&config)?;
        Ok(Self::with_orchestrator(config, root, orchestrator))
    }

    /// Create a controller around a ready-made orchestrator
    pub fn with_orchestrator<P: AsRef<Path>>(config: Config, root: P, orchestrator: FallbackOrchestrator) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            mapper: PathMapper::new(config.path_mappings.clone()),
            working_dir: std::env::current_dir().unwrap_or_else(|_| root.clone()),
            root,
            config,
            orchestrator,
        }
    }

    /// Resolve relative file arguments against `dir` instead of the process working directory
    pub fn with_working_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.working_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn warn_about_backends(&self) {
        static CREDENTIALS_WARNING: Once = Once::new();
        CREDENTIALS_WARNING.call_once(|| {
            let service = self.orchestrator.service();
            if service.has_credentials() {
                return;
            }

            let keys: Vec<&str> = HostedProvider::ALL.iter().map(|p| p.api_key_env()).collect();
            warn!("No API key configured (set one of {}), using line-by-line fallback", keys.join(", "));

            if !service.has_usable_backend() {
                let tool = service.cli_tool().map(|t| t.program().to_string()).unwrap_or_default();
                warn!(
                    "Translation tool '{}' not found either: documents will keep the original text",
                    tool
                );
            }
        });
    }

    /// Resolve a user-supplied path to one relative to the docs root
    ///
    /// Relative paths are looked up from the working directory first, then from the root.
    fn relative_to_root(&self, path: &Path) -> Result<PathBuf> {
        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            let from_working_dir = self.working_dir.join(path);
            if FileManager::file_exists(&from_working_dir) {
                from_working_dir
            } else {
                self.root.join(path)
            }
        };

        if !FileManager::file_exists(&full) {
            return Err(TranslationError::FileNotFound(full).into());
        }

        let root = self.root.canonicalize()
            .with_context(|| format!("Cannot resolve docs root {}", self.root.display()))?;
        let full = full.canonicalize()
            .with_context(|| format!("Cannot resolve {}", full.display()))?;

        full.strip_prefix(&root)
            .map(Path::to_path_buf)
            .map_err(|_| anyhow!("{} is outside the docs root {}", full.display(), root.display()))
    }

    /// Translate one named markdown file
    pub async fn translate_file(&self, path: &Path, force: bool) -> Result<SingleFileOutcome> {
        let source = self.relative_to_root(path)?;

        if source.extension().and_then(|e| e.to_str()) != Some("md") {
            return Err(anyhow!("Not a markdown file: {}", source.display()));
        }

        let target = self.mapper.to_target(&source)?;
        let source_path = self.root.join(&source);
        let target_path = self.root.join(&target);

        if FileManager::file_exists(&target_path) && !force {
            warn!("Skipping {}, {} already exists (use -f to force overwrite)", source.display(), target.display());
            return Ok(SingleFileOutcome::Skipped { target });
        }

        self.warn_about_backends();

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("Translating {}", source.display()));
        spinner.enable_steady_tick(Duration::from_millis(100));

        let start_time = Instant::now();
        let result = self.orchestrator.translate_file(&source_path, &target_path).await;
        spinner.finish_and_clear();
        let outcome = result?;

        let source_bytes = FileManager::file_size(&source_path)?;
        let target_bytes = FileManager::file_size(&target_path)?;
        info!(
            "Success: {} ({} bytes) -> {} ({} bytes) in {}",
            source.display(),
            source_bytes,
            target.display(),
            target_bytes,
            Self::format_duration(start_time.elapsed())
        );

        Ok(SingleFileOutcome::Translated {
            source,
            target,
            source_bytes,
            target_bytes,
            tier: outcome.tier,
        })
    }

    /// Translate every file matching `pattern`
    pub async fn translate_all(&self, pattern: &str, force: bool, concurrent: usize, verbose: bool) -> Result<BatchSummary> {
        let start_time = Instant::now();
        let driver = BatchDriver::new(&self.root, self.orchestrator.clone(), self.mapper.clone());
        let plan = driver.plan(pattern, force)?;

        if plan.total() == 0 {
            info!("No files match {}", pattern);
            return Ok(BatchSummary::default());
        }

        for task in &plan.to_translate {
            let label = if task.target_exists { "will overwrite" } else { "new" };
            info!("+ {} ({})", task.source.display(), label);
        }
        for task in &plan.skipped {
            info!("- {} (skipped - exists)", task.source.display());
        }

        if plan.to_translate.is_empty() {
            info!("Nothing to translate, {} files already translated (use -f to force overwrite)", plan.skipped.len());
            return Ok(BatchSummary {
                skipped: plan.skipped.len(),
                ..BatchSummary::default()
            });
        }

        self.warn_about_backends();

        let progress_bar = ProgressBar::new(plan.to_translate.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));

        let pb = progress_bar.clone();
        let summary = driver
            .run_plan(plan, concurrent, move |done, _total| pb.set_position(done as u64))
            .await;
        progress_bar.finish_and_clear();

        if verbose {
            for report in &summary.reports {
                match (&report.status, &report.tier) {
                    (FileStatus::Succeeded, Some(tier)) => {
                        info!("{} -> {} ({})", report.task.source.display(), report.task.target.display(), describe_tier(tier));
                    }
                    (FileStatus::Failed(reason), _) => error!("{}: {}", report.task.source.display(), reason),
                    _ => {}
                }
            }
        }

        info!(
            "Done in {}: {} translated, {} failed, {} skipped",
            Self::format_duration(start_time.elapsed()),
            summary.completed,
            summary.failed,
            summary.skipped
        );

        Ok(summary)
    }

    /// Translate changed documents until Ctrl-C
    pub async fn watch(&self) -> Result<()> {
        self.warn_about_backends();
        DocumentWatcher::new(&self.root, &self.config.pattern, self.mapper.clone(), self.orchestrator.clone())?
            .run()
            .await
    }

    /// Check translated documents and print the findings
    pub fn validate(&self, verbose: bool) -> Result<ValidationReport> {
        let validator = TranslationValidator::new(&self.root, self.mapper.clone());
        let report = validator.validate(&self.config.validate_pattern)?;

        for file in &report.files {
            if verbose {
                for issue in &file.issues {
                    warn!("{}: {}", file.path.display(), issue);
                }
            } else {
                warn!("{}: {} issues", file.path.display(), file.issues.len());
            }
        }

        for kind in IssueKind::ALL {
            let count = report.count(kind);
            if count > 0 {
                info!("{}: {}", kind.label(), count);
            }
        }

        if report.is_clean() {
            info!("Checked {} files, no issues found", report.files_checked);
        } else {
            info!(
                "Checked {} files, {} issues in {} files",
                report.files_checked,
                report.total_issues(),
                report.files.len()
            );
        }
        debug!("Validation finished");

        Ok(report)
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

fn describe_tier(tier: &TranslationTier) -> String {
    match tier {
        TranslationTier::Document { backend } => format!("whole document, {}", backend),
        TranslationTier::Lines => "line by line".to_string(),
        TranslationTier::Unchanged => "nothing to translate".to_string(),
    }
}
