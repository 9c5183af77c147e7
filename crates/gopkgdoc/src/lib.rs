//! Documentation for Go packages in remote repositories
//!
//! `DocCache::load_docs` fetches or refreshes a package's repository and
//! returns its documentation, rebuilding only after the repository changed.

pub mod cache;
pub mod error;

pub use cache::DocCache;
pub use error::DocsError;
pub use libgopkgdoc_core::Package;
