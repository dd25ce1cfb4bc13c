//! Batch aggregation across Cases and Realizations.
//!
//! Walks a study tree, decodes every enumerated result file, applies
//! the chosen aggregator per file and combines the per-file results
//! into one summary.

use std::path::PathBuf;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use crate::aggregate::{self, AggregationMethod, AggregationResult};
use crate::error::{ProteusError, Result};
use crate::loader::{self, LoadOptions};
use crate::models::{BatchStats, PerFileResult};
use crate::walker::DirectoryAggregationWalker;

/// What to do when an enumerated path does not exist on disk.
///
/// The walker never guarantees existence, so skipping is the normal
/// choice; failing turns an incomplete study into a hard error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPathPolicy {
    Skip,
    Fail,
}

/// Outcome of one batch run.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Per-file aggregation results, in sorted path order.
    pub per_file: Vec<PerFileResult<AggregationResult>>,
    /// Combined summary across all files, when any file succeeded.
    pub combined: Option<AggregationResult>,
    pub stats: BatchStats,
}

/// Batch processor for one feature/file combination.
#[derive(Debug)]
pub struct BatchProcessor {
    walker: DirectoryAggregationWalker,
    feature: String,
    file_name: String,
    method: AggregationMethod,
    options: LoadOptions,
    missing_path_policy: MissingPathPolicy,
    show_progress: bool,
}

impl BatchProcessor {
    pub fn new(
        base_folder: impl Into<PathBuf>,
        feature: impl Into<String>,
        file_name: impl Into<String>,
        method: AggregationMethod,
    ) -> Self {
        Self {
            walker: DirectoryAggregationWalker::new(base_folder),
            feature: feature.into(),
            file_name: file_name.into(),
            method,
            options: LoadOptions::default(),
            missing_path_policy: MissingPathPolicy::Skip,
            show_progress: false,
        }
    }

    /// Configure decoding options applied to every file.
    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Configure the missing-path policy.
    pub fn with_missing_path_policy(mut self, policy: MissingPathPolicy) -> Self {
        self.missing_path_policy = policy;
        self
    }

    /// Show a progress bar while walking.
    pub fn with_progress(mut self) -> Self {
        self.show_progress = true;
        self
    }

    /// Walk, decode, aggregate and combine.
    pub fn run(&self) -> Result<BatchOutcome> {
        let start_time = Instant::now();
        let mut stats = BatchStats::default();

        let cases = self.walker.cases()?;
        stats.cases_found = cases.len();
        for case in &cases {
            stats.realizations_found += self.walker.realizations(case)?.len();
        }

        let mut paths = self.walker.enumerate(&self.feature, &self.file_name)?;
        // The walker makes no ordering promise; sort for stable reports.
        paths.sort();

        let aggregator = self.method.aggregator();
        debug!(
            "Aggregating {} paths with {} aggregator",
            paths.len(),
            aggregator.name()
        );

        let progress = if self.show_progress {
            let bar = ProgressBar::new(paths.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            Some(bar)
        } else {
            None
        };

        let mut per_file = Vec::new();
        for path in paths {
            if let Some(bar) = &progress {
                bar.inc(1);
            }

            if !path.exists() {
                match self.missing_path_policy {
                    MissingPathPolicy::Skip => {
                        warn!("Skipping missing path: {}", path.display());
                        stats.files_missing += 1;
                        continue;
                    }
                    MissingPathPolicy::Fail => {
                        return Err(ProteusError::PathNotFound { path });
                    }
                }
            }

            let result = loader::decode_file(&path, &self.options)
                .and_then(|table| aggregator.aggregate(&table));

            match result {
                Ok(aggregated) => {
                    stats.files_processed += 1;
                    per_file.push(PerFileResult {
                        path,
                        result: aggregated,
                    });
                }
                Err(error) => {
                    warn!("Failed to process {}: {}", path.display(), error);
                    stats.files_failed += 1;
                }
            }
        }

        if let Some(bar) = progress {
            bar.finish_and_clear();
        }

        let combined = if per_file.is_empty() {
            None
        } else {
            let results: Vec<AggregationResult> =
                per_file.iter().map(|p| p.result.clone()).collect();
            Some(aggregate::combine(&results)?)
        };

        stats.processing_time_ms = start_time.elapsed().as_millis();
        Ok(BatchOutcome {
            per_file,
            combined,
            stats,
        })
    }
}
