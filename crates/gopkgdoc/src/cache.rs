//! Documentation cache keyed by clone location

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use libgopkgdoc_core::{build_package, CoreError, DocsConfig, Package, VcsBackend};
use libgopkgdoc_git::{GitCommand, LibGit, Synchronizer, Vcs};
use tracing::{debug, info, warn};

use crate::error::DocsError;

/// Built packages, rebuilt whenever a sync reports new revisions.
///
/// Concurrent loads of the same package may both build it; the last insert
/// wins and nothing is merged. Readers can see the previous entry while a
/// rebuild is running.
///
/// A location whose working copy changed stays pending until a build for it
/// succeeds, so a failed rebuild is retried on the next load instead of
/// falling back to the entry from before the change.
#[derive(Debug)]
pub struct DocCache {
    sync: Synchronizer,
    entries: RwLock<HashMap<String, Arc<Package>>>,
    /// Clone locations changed since their last successful build
    pending: Mutex<HashSet<String>>,
}

impl DocCache {
    pub fn new(sync: Synchronizer) -> Self {
        Self {
            sync,
            entries: RwLock::new(HashMap::new()),
            pending: Mutex::new(HashSet::new()),
        }
    }

    /// Cache with a synchronizer set up from configuration
    pub fn from_config(config: &DocsConfig) -> Self {
        let vcs: Box<dyn Vcs + Send + Sync> = match config.backend {
            VcsBackend::Command => Box::new(GitCommand::new()),
            VcsBackend::Libgit2 => Box::new(LibGit::new()),
        };
        Self::new(Synchronizer::new(
            config.scratch_dir(),
            config.refresh_cooldown(),
            vcs,
        ))
    }

    pub fn synchronizer(&self) -> &Synchronizer {
        &self.sync
    }

    /// Documentation for the package at `import_path`, fetched from
    /// `clone_location`.
    ///
    /// A fetch or build error is returned as is and leaves the cache entry
    /// untouched. After a build error the location is rebuilt on every load
    /// until a build succeeds.
    pub fn load_docs(&self, import_path: &str, clone_location: &str) -> Result<Arc<Package>, DocsError> {
        let outcome = self.sync.sync(import_path, clone_location)?;

        let stale = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if outcome.changed {
                pending.insert(clone_location.to_string());
            }
            pending.contains(clone_location)
        };

        if !stale {
            if let Some(pkg) = self.cached(clone_location) {
                debug!(import_path, "documentation cache hit");
                return Ok(pkg);
            }
        }

        info!(import_path, path = %outcome.local_path.display(), "parsing");
        let files = go_files(&outcome.local_path)?;
        let pkg = match build_package(import_path, &files) {
            Ok(pkg) => Arc::new(pkg),
            Err(e) => {
                warn!(import_path, error = %e, "build failed, keeping location pending");
                return Err(e.into());
            }
        };

        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(clone_location.to_string(), Arc::clone(&pkg));
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(clone_location);
        Ok(pkg)
    }

    /// Whether a clone location changed and has not been rebuilt since
    pub fn is_pending(&self, clone_location: &str) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(clone_location)
    }

    /// The current entry for a clone location, without syncing
    pub fn cached(&self, clone_location: &str) -> Option<Arc<Package>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(clone_location)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Go files directly inside `dir`
fn go_files(dir: &Path) -> Result<Vec<PathBuf>, CoreError> {
    let pattern = format!("{}/*.go", glob::Pattern::escape(&dir.to_string_lossy()));
    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        match entry {
            Ok(path) => files.push(path),
            Err(e) => warn!(error = %e, "skipping unreadable path"),
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_from_config() {
        let dir = tempdir().unwrap();
        let config = DocsConfig {
            scratch_dir: Some(dir.path().to_path_buf()),
            refresh_cooldown_secs: Some(30),
            backend: VcsBackend::Libgit2,
        };
        let cache = DocCache::from_config(&config);
        assert_eq!(cache.synchronizer().scratch_dir(), dir.path());
        assert_eq!(cache.synchronizer().cooldown(), std::time::Duration::from_secs(30));
        assert!(cache.is_empty());
        assert!(cache.cached("anything").is_none());
    }

    #[test]
    fn test_go_files_ignores_other_entries() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.go"), "package a\n").unwrap();
        fs::write(dir.path().join("a_test.go"), "package a\n").unwrap();
        fs::write(dir.path().join("README.md"), "# a\n").unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.go"), "package b\n").unwrap();

        let mut names: Vec<String> = go_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.go", "a_test.go"]);
    }

    #[test]
    fn test_go_files_with_special_characters_in_dir() {
        let dir = tempdir().unwrap();
        let odd = dir.path().join("pkg[v2]");
        fs::create_dir_all(&odd).unwrap();
        fs::write(odd.join("x.go"), "package x\n").unwrap();
        assert_eq!(go_files(&odd).unwrap().len(), 1);
    }
}
