//! Single-pass tree scanner
//!
//! Walks a root once with the `ignore` walker. Excluded directories are pruned
//! before descent. Every other directory name and file is handed to the
//! [`Classifier`](classify::Classifier), which evaluates the whole catalog
//! against it.
//!
//! With more than one thread each walker worker owns a private [`ScanResult`]
//! and [`ScanStats`]. Workers send them over a channel when they are dropped,
//! and the partials are merged once the walk has joined, so no partial result
//! is visible before the scan completes.

mod classify;
mod control;
mod exclusions;
mod sample;

pub use classify::Classifier;
pub use control::{CancelToken, ScanControl, StopReason};
pub use exclusions::{ExclusionSet, DEFAULT_EXCLUDED_DIRS};
pub use sample::{sample_file, ContentSample, Sample, HEAD_WINDOW_BYTES};

use crate::aggregate::{aggregate, ScanResult};
use crate::catalog::Catalog;
use crate::manifest::{ManifestInspector, MatchMode};
use crossbeam_channel::Sender;
use ignore::{DirEntry, ParallelVisitor, ParallelVisitorBuilder, WalkBuilder, WalkState};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

pub const DEFAULT_SAMPLE_LINES: usize = 5;
pub const DEFAULT_TAIL_WINDOW_BYTES: u64 = 4 * 1024;

/// Entry order of the sequential walker
///
/// Only the single-threaded walk honours it; parallel walks have no defined
/// order. The result never depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalOrder {
    /// Whatever the filesystem returns
    Native,
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Worker threads; 0 picks a count from the available parallelism and 1
    /// walks sequentially on the calling thread
    pub threads: usize,
    pub max_depth: Option<usize>,
    /// Lines sampled from the head and from the tail of every file
    pub sample_lines: usize,
    pub tail_window_bytes: u64,
    pub respect_gitignore: bool,
    pub follow_links: bool,
    pub timeout: Option<Duration>,
    pub order: TraversalOrder,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            max_depth: None,
            sample_lines: DEFAULT_SAMPLE_LINES,
            tail_window_bytes: DEFAULT_TAIL_WINDOW_BYTES,
            respect_gitignore: false,
            follow_links: false,
            timeout: None,
            order: TraversalOrder::default(),
        }
    }
}

impl ScanConfig {
    pub fn sequential() -> Self {
        Self {
            threads: 1,
            ..Self::default()
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_order(mut self, order: TraversalOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Counters collected during one scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub files_scanned: u64,
    pub directories_visited: u64,
    pub directories_excluded: u64,
    pub binary_files: u64,
    pub unreadable_files: u64,
    pub manifests_inspected: u64,
    pub manifest_errors: u64,
    pub walk_errors: u64,
    /// The walk stopped early on cancellation or deadline
    pub truncated: bool,
}

impl ScanStats {
    pub fn merge(&mut self, other: &ScanStats) {
        self.files_scanned += other.files_scanned;
        self.directories_visited += other.directories_visited;
        self.directories_excluded += other.directories_excluded;
        self.binary_files += other.binary_files;
        self.unreadable_files += other.unreadable_files;
        self.manifests_inspected += other.manifests_inspected;
        self.manifest_errors += other.manifest_errors;
        self.walk_errors += other.walk_errors;
        self.truncated |= other.truncated;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub root: PathBuf,
    pub technologies: ScanResult,
    pub stats: ScanStats,
    pub elapsed_ms: u64,
}

pub struct TreeScanner {
    catalog: Arc<Catalog>,
    config: ScanConfig,
    exclusions: Arc<ExclusionSet>,
    inspector: ManifestInspector,
}

impl TreeScanner {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            config: ScanConfig::default(),
            exclusions: Arc::new(ExclusionSet::default()),
            inspector: ManifestInspector::default(),
        }
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = Arc::new(exclusions);
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.inspector = self.inspector.with_mode(mode);
        self
    }

    pub fn with_inspector(mut self, inspector: ManifestInspector) -> Self {
        self.inspector = inspector;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Scans with the configured timeout, if any
    pub fn scan(&self, root: &Path) -> ScanReport {
        let control = match self.config.timeout {
            Some(timeout) => ScanControl::with_timeout(timeout),
            None => ScanControl::unbounded(),
        };
        self.scan_with(root, &control)
    }

    pub fn scan_with(&self, root: &Path, control: &ScanControl) -> ScanReport {
        let start = Instant::now();

        info!(
            root = %root.display(),
            threads = self.config.threads,
            max_depth = ?self.config.max_depth,
            match_mode = %self.inspector.mode(),
            "Starting tree scan"
        );

        let classifier = Classifier::new(
            &self.catalog,
            self.inspector,
            self.config.sample_lines,
            self.config.tail_window_bytes,
        );
        let excluded = Arc::new(AtomicU64::new(0));
        let builder = self.walk_builder(root, Arc::clone(&excluded));

        let (technologies, mut stats) = if self.config.threads == 1 {
            walk_sequential(&builder, &classifier, control)
        } else {
            walk_parallel(&builder, &classifier, control)
        };
        stats.directories_excluded = excluded.load(Ordering::Relaxed);

        let elapsed_ms = start.elapsed().as_millis() as u64;

        if stats.truncated {
            warn!(
                root = %root.display(),
                elapsed_ms,
                files_scanned = stats.files_scanned,
                "Scan stopped early, returning partial result"
            );
        }

        info!(
            technologies = technologies.len(),
            files_scanned = stats.files_scanned,
            directories_visited = stats.directories_visited,
            directories_excluded = stats.directories_excluded,
            manifests_inspected = stats.manifests_inspected,
            elapsed_ms,
            "Tree scan complete"
        );

        ScanReport {
            root: root.to_path_buf(),
            technologies,
            stats,
            elapsed_ms,
        }
    }

    fn walk_builder(&self, root: &Path, excluded: Arc<AtomicU64>) -> WalkBuilder {
        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .hidden(false)
            .git_ignore(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore)
            .follow_links(self.config.follow_links)
            .max_depth(self.config.max_depth)
            .threads(self.config.threads);

        match self.config.order {
            TraversalOrder::Native => {}
            TraversalOrder::Ascending => {
                builder.sort_by_file_name(|a, b| a.cmp(b));
            }
            TraversalOrder::Descending => {
                builder.sort_by_file_name(|a, b| b.cmp(a));
            }
        }

        let exclusions = Arc::clone(&self.exclusions);
        builder.filter_entry(move |entry| {
            if entry.depth() == 0 || !entry.file_type().is_some_and(|t| t.is_dir()) {
                return true;
            }
            let skip = entry
                .file_name()
                .to_str()
                .is_some_and(|name| exclusions.is_excluded(name));
            if skip {
                trace!(path = %entry.path().display(), "Excluded directory");
                excluded.fetch_add(1, Ordering::Relaxed);
            }
            !skip
        });

        builder
    }
}

fn visit_entry(
    entry: Result<DirEntry, ignore::Error>,
    classifier: &Classifier<'_>,
    control: &ScanControl,
    result: &mut ScanResult,
    stats: &mut ScanStats,
) -> WalkState {
    let entry = match entry {
        Ok(entry) => entry,
        Err(err) => {
            debug!(error = %err, "Failed to read directory entry");
            stats.walk_errors += 1;
            return WalkState::Continue;
        }
    };

    match entry.file_type() {
        Some(ft) if ft.is_dir() => {
            if let Some(reason) = control.should_stop() {
                debug!(path = %entry.path().display(), ?reason, "Stopping walk");
                stats.truncated = true;
                return WalkState::Quit;
            }
            stats.directories_visited += 1;
            if entry.depth() > 0 {
                if let Some(name) = entry.file_name().to_str() {
                    classifier.classify_dir(name, result);
                }
            }
        }
        Some(ft) if ft.is_file() => classifier.classify_file(entry.path(), result, stats),
        _ => trace!(path = %entry.path().display(), "Skipping special file"),
    }

    WalkState::Continue
}

fn walk_sequential(
    builder: &WalkBuilder,
    classifier: &Classifier<'_>,
    control: &ScanControl,
) -> (ScanResult, ScanStats) {
    let mut result = ScanResult::new();
    let mut stats = ScanStats::default();

    for entry in builder.build() {
        if let WalkState::Quit = visit_entry(entry, classifier, control, &mut result, &mut stats) {
            break;
        }
    }

    (result, stats)
}

fn walk_parallel(
    builder: &WalkBuilder,
    classifier: &Classifier<'_>,
    control: &ScanControl,
) -> (ScanResult, ScanStats) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut workers = WorkerBuilder {
        classifier,
        control,
        tx,
    };
    builder.build_parallel().visit(&mut workers);
    drop(workers);

    let mut stats = ScanStats::default();
    let result = aggregate(rx.iter().map(|(part, part_stats)| {
        stats.merge(&part_stats);
        part
    }));
    (result, stats)
}

type Partial = (ScanResult, ScanStats);

struct WorkerBuilder<'s> {
    classifier: &'s Classifier<'s>,
    control: &'s ScanControl,
    tx: Sender<Partial>,
}

impl<'s> ParallelVisitorBuilder<'s> for WorkerBuilder<'s> {
    fn build(&mut self) -> Box<dyn ParallelVisitor + 's> {
        Box::new(Worker {
            classifier: self.classifier,
            control: self.control,
            tx: self.tx.clone(),
            result: ScanResult::new(),
            stats: ScanStats::default(),
        })
    }
}

struct Worker<'s> {
    classifier: &'s Classifier<'s>,
    control: &'s ScanControl,
    tx: Sender<Partial>,
    result: ScanResult,
    stats: ScanStats,
}

impl ParallelVisitor for Worker<'_> {
    fn visit(&mut self, entry: Result<DirEntry, ignore::Error>) -> WalkState {
        visit_entry(
            entry,
            self.classifier,
            self.control,
            &mut self.result,
            &mut self.stats,
        )
    }
}

impl Drop for Worker<'_> {
    fn drop(&mut self) {
        let partial = (
            std::mem::take(&mut self.result),
            std::mem::take(&mut self.stats),
        );
        // The receiver outlives every worker
        let _ = self.tx.send(partial);
    }
}
