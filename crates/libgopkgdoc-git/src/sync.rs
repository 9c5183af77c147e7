//! Working-copy synchronization
//!
//! Makes sure a local copy of a package's repository exists and is current,
//! without hitting the remote more than once per cooldown period.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::GitError;
use crate::vcs::Vcs;

/// Default minimum delay between two refreshes of one working copy
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5 * 60);

/// Result of a sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Working copy directory
    pub local_path: PathBuf,
    /// Whether the working copy was created or received new revisions
    pub changed: bool,
}

/// Clones and refreshes working copies under a scratch directory.
///
/// All repository activity goes through one mutex, so at most one clone or
/// refresh runs at a time per synchronizer.
pub struct Synchronizer {
    scratch_dir: PathBuf,
    cooldown: Duration,
    vcs: Box<dyn Vcs + Send + Sync>,
    /// Last refresh per working copy
    refreshed: Mutex<HashMap<PathBuf, Instant>>,
}

impl std::fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("scratch_dir", &self.scratch_dir)
            .field("cooldown", &self.cooldown)
            .finish()
    }
}

impl Synchronizer {
    pub fn new(scratch_dir: impl Into<PathBuf>, cooldown: Duration, vcs: Box<dyn Vcs + Send + Sync>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            cooldown,
            vcs,
            refreshed: Mutex::new(HashMap::new()),
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Working copy location for an import path
    pub fn local_path(&self, import_path: &str) -> Result<PathBuf, GitError> {
        let relative = Path::new(import_path);
        let valid = !import_path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !valid {
            return Err(GitError::InvalidImportPath(import_path.to_string()));
        }
        Ok(self.scratch_dir.join(relative))
    }

    /// Ensure the working copy for `import_path` exists, cloning it from
    /// `clone_location` the first time and refreshing it at most once per
    /// cooldown afterwards.
    pub fn sync(&self, import_path: &str, clone_location: &str) -> Result<SyncOutcome, GitError> {
        let local_path = self.local_path(import_path)?;
        let mut refreshed = self.refreshed.lock().unwrap_or_else(PoisonError::into_inner);

        if !local_path.join(self.vcs.metadata_dir()).exists() {
            info!(import_path, clone_location, "cloning");
            if let Some(parent) = local_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            self.vcs.fetch(clone_location, &local_path)?;
            refreshed.insert(local_path.clone(), Instant::now());
            return Ok(SyncOutcome {
                local_path,
                changed: true,
            });
        }

        if let Some(last) = refreshed.get(&local_path) {
            if last.elapsed() <= self.cooldown {
                debug!(import_path, "refreshed recently, skipping");
                return Ok(SyncOutcome {
                    local_path,
                    changed: false,
                });
            }
        }

        info!(import_path, "updating");
        let changed = self.vcs.refresh(&local_path)?;
        refreshed.insert(local_path.clone(), Instant::now());
        debug!(import_path, changed, "update finished");
        Ok(SyncOutcome { local_path, changed })
    }
}
