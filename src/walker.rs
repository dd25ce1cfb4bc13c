//! Directory enumeration for batch aggregation.
//!
//! Simulation studies lay results out as
//! `base/Case*/Realization*/Results/<feature>/<file>`; the walker
//! enumerates those paths from the immediate children it finds. Paths
//! are yielded whether or not they exist — existence is the loader's
//! concern — and in directory-listing order; callers needing a
//! deterministic order must sort explicitly.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::constants::{
    is_feature_dir_name, is_supported_file_name, CASE_DIR_PREFIX, REALIZATION_DIR_PREFIX,
    RESULTS_DIR_NAME,
};
use crate::error::{ProteusError, Result};

/// Enumerates per-realization result paths under a study base folder.
#[derive(Debug, Clone)]
pub struct DirectoryAggregationWalker {
    base: PathBuf,
}

impl DirectoryAggregationWalker {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Immediate child directories whose names match a prefix.
    fn prefixed_dirs(&self, parent: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
        if !parent.is_dir() {
            return Err(ProteusError::PathNotFound {
                path: parent.to_path_buf(),
            });
        }

        let mut dirs = Vec::new();
        for entry in fs::read_dir(parent)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if path.is_dir() && name.starts_with(prefix) {
                dirs.push(path);
            }
        }
        Ok(dirs)
    }

    /// `Case*` directories directly under the base folder.
    pub fn cases(&self) -> Result<Vec<PathBuf>> {
        self.prefixed_dirs(&self.base, CASE_DIR_PREFIX)
    }

    /// `Realization*` directories directly under one case.
    pub fn realizations(&self, case: &Path) -> Result<Vec<PathBuf>> {
        self.prefixed_dirs(case, REALIZATION_DIR_PREFIX)
    }

    /// Every `Case*/Realization*/Results/<feature>/<file_name>` path.
    ///
    /// The paths are constructed, not checked: a missing file is a
    /// policy decision for the caller, not for the walker.
    pub fn enumerate(&self, feature: &str, file_name: &str) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for case in self.cases()? {
            for realization in self.realizations(&case)? {
                paths.push(
                    realization
                        .join(RESULTS_DIR_NAME)
                        .join(feature)
                        .join(file_name),
                );
            }
        }

        debug!(
            "Enumerated {} result paths for feature '{}' file '{}'",
            paths.len(),
            feature,
            file_name
        );
        Ok(paths)
    }

    /// Feature directory names found anywhere under
    /// `Case*/Realization*/Results/`, excluding the reserved
    /// non-feature directories. Sorted and deduplicated.
    pub fn discover_features(&self) -> Result<Vec<String>> {
        if !self.base.is_dir() {
            return Err(ProteusError::PathNotFound {
                path: self.base.clone(),
            });
        }

        let mut features = BTreeSet::new();
        for entry in WalkDir::new(&self.base).min_depth(4).max_depth(4) {
            let entry = entry.map_err(|e| ProteusError::Io(e.into()))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if !in_results_tree(entry.path(), &self.base) {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if is_feature_dir_name(&name) {
                features.insert(name.into_owned());
            }
        }

        Ok(features.into_iter().collect())
    }

    /// Supported result files present for one feature anywhere in the
    /// tree. Sorted and deduplicated.
    pub fn discover_files(&self, feature: &str) -> Result<Vec<String>> {
        if !self.base.is_dir() {
            return Err(ProteusError::PathNotFound {
                path: self.base.clone(),
            });
        }

        let mut files = BTreeSet::new();
        for entry in WalkDir::new(&self.base).min_depth(5).max_depth(5) {
            let entry = entry.map_err(|e| ProteusError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(parent) = entry.path().parent() else {
                continue;
            };
            if parent.file_name().map_or(true, |n| n != feature) {
                continue;
            }
            if !in_results_tree(parent, &self.base) {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if is_supported_file_name(&name) {
                files.insert(name.into_owned());
            }
        }

        Ok(files.into_iter().collect())
    }
}

/// Whether `dir` is a `Case*/Realization*/Results/<child>` directory of
/// `base`.
fn in_results_tree(dir: &Path, base: &Path) -> bool {
    let Ok(relative) = dir.strip_prefix(base) else {
        return false;
    };
    let components: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    components.len() == 4
        && components[0].starts_with(CASE_DIR_PREFIX)
        && components[1].starts_with(REALIZATION_DIR_PREFIX)
        && components[2] == RESULTS_DIR_NAME
}
