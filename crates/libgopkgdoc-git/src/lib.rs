//! Repository synchronization for gopkgdoc
//!
//! This crate keeps local working copies of package repositories:
//! - `vcs`: backends for the `git` executable and libgit2
//! - `sync`: clone-once, refresh-with-cooldown synchronizer

pub mod error;
pub mod sync;
pub mod vcs;

pub use error::GitError;
pub use sync::{SyncOutcome, Synchronizer, DEFAULT_COOLDOWN};
pub use vcs::{GitCommand, LibGit, Vcs};
