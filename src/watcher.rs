/*!
 * Watch mode.
 *
 * Polls the source documents, hashing their content, and queues documents
 * that were added or changed once they have been quiet for the debounce
 * period. A single worker translates the queue in order. Ctrl-C stops
 * polling; a translation still running at that point is abandoned.
 */

use anyhow::Result;
use log::{debug, error, info, warn};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::file_utils::{FileManager, GlobPattern, PathMapper};
use crate::translation::orchestrator::FallbackOrchestrator;

/// Content hash per source document, keyed by path relative to the root
pub type Snapshot = HashMap<PathBuf, String>;

/// Difference between two snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Changed(PathBuf),
    Removed(PathBuf),
}

/// Polling watcher over the source documents
pub struct DocumentWatcher {
    root: PathBuf,
    pattern: GlobPattern,
    mapper: PathMapper,
    orchestrator: FallbackOrchestrator,
    poll_interval: Duration,
    debounce: Duration,
}

impl DocumentWatcher {
    pub fn new<P: AsRef<Path>>(
        root: P,
        pattern: &str,
        mapper: PathMapper,
        orchestrator: FallbackOrchestrator,
    ) -> Result<Self> {
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            pattern: GlobPattern::new(pattern)?,
            mapper,
            orchestrator,
            poll_interval: Duration::from_secs(1),
            debounce: Duration::from_secs(2),
        })
    }

    pub fn with_timing(mut self, poll_interval: Duration, debounce: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.debounce = debounce;
        self
    }

    /// Hash every matching document
    pub fn snapshot(&self) -> Result<Snapshot> {
        let mut snapshot = Snapshot::new();
        for relative in FileManager::find_matching_files(&self.root, &self.pattern)? {
            match std::fs::read(self.root.join(&relative)) {
                Ok(bytes) => {
                    snapshot.insert(relative, hash_bytes(&bytes));
                }
                // Removed between listing and reading
                Err(e) => debug!("Skipping {}: {}", relative.display(), e),
            }
        }
        Ok(snapshot)
    }

    /// Events that turn `previous` into `current`, sorted by path
    pub fn diff(previous: &Snapshot, current: &Snapshot) -> Vec<WatchEvent> {
        let mut events: Vec<WatchEvent> = current
            .iter()
            .filter(|(path, hash)| previous.get(*path) != Some(*hash))
            .map(|(path, _)| WatchEvent::Changed(path.clone()))
            .chain(
                previous
                    .keys()
                    .filter(|path| !current.contains_key(*path))
                    .map(|path| WatchEvent::Removed(path.clone())),
            )
            .collect();

        events.sort_by(|a, b| event_path(a).cmp(event_path(b)));
        events
    }

    /// Watch until Ctrl-C
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Watch until `shutdown` completes
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let mut known = self.snapshot()?;
        info!(
            "Watching {} documents matching {} (Ctrl-C to stop)",
            known.len(),
            self.pattern.as_str()
        );

        let (sender, receiver) = mpsc::unbounded_channel::<PathBuf>();
        let worker = tokio::spawn(translate_queue(
            receiver,
            self.root.clone(),
            self.mapper.clone(),
            self.orchestrator.clone(),
        ));

        let mut pending: HashMap<PathBuf, Instant> = HashMap::new();
        let mut interval = tokio::time::interval(self.poll_interval);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Stopping watcher");
                    break;
                }
                _ = interval.tick() => {
                    let current = match self.snapshot() {
                        Ok(current) => current,
                        Err(e) => {
                            warn!("Failed to scan documents: {:#}", e);
                            continue;
                        }
                    };

                    for event in Self::diff(&known, &current) {
                        match event {
                            WatchEvent::Changed(path) => {
                                debug!("Changed: {}", path.display());
                                pending.insert(path, Instant::now());
                            }
                            WatchEvent::Removed(path) => {
                                pending.remove(&path);
                                match self.mapper.to_target(&path) {
                                    Ok(target) => warn!(
                                        "{} was removed; {} may be deleted",
                                        path.display(),
                                        target.display()
                                    ),
                                    Err(_) => warn!("{} was removed", path.display()),
                                }
                            }
                        }
                    }
                    known = current;

                    let ready: Vec<PathBuf> = pending
                        .iter()
                        .filter(|(_, changed)| changed.elapsed() >= self.debounce)
                        .map(|(path, _)| path.clone())
                        .collect();
                    for path in ready {
                        pending.remove(&path);
                        if sender.send(path).is_err() {
                            error!("Translation worker stopped");
                        }
                    }
                }
            }
        }

        drop(sender);
        worker.abort();
        Ok(())
    }
}

async fn translate_queue(
    mut receiver: mpsc::UnboundedReceiver<PathBuf>,
    root: PathBuf,
    mapper: PathMapper,
    orchestrator: FallbackOrchestrator,
) {
    while let Some(source) = receiver.recv().await {
        let target = match mapper.to_target(&source) {
            Ok(target) => target,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        info!("Translating {} -> {}", source.display(), target.display());
        match orchestrator.translate_file(root.join(&source), root.join(&target)).await {
            Ok(_) => info!("Updated {}", target.display()),
            Err(e) => error!("Failed to translate {}: {}", source.display(), e),
        }
    }
}

fn event_path(event: &WatchEvent) -> &Path {
    match event {
        WatchEvent::Changed(path) | WatchEvent::Removed(path) => path,
    }
}

fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
