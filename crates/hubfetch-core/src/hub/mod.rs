//! Minimal blocking client for a Hugging Face style hub.
//!
//! Lists a repository through the JSON API and downloads each file through
//! the `resolve` endpoint into a local directory, resuming partial files.

mod client;
mod error;
mod info;
mod paths;
mod repo;
mod snapshot;

pub use client::{FileTransfer, HubClient, HubClientConfig};
pub use info::{LfsInfo, RepoInfo, Sibling};
pub use paths::{download_cache_dir, partial_path, safe_relative_path};
pub use repo::{HubEndpoint, RepoId, RepoType};
pub use snapshot::{HubSnapshotFetcher, SnapshotStats};
