//! Snapshot download: every file of a repository into a local directory.

use super::client::{FileTransfer, HubClient};
use super::error::{io_to_fetch_error, transfer_to_fetch_error};
use super::info::Sibling;
use super::paths::{download_cache_dir, partial_path, safe_relative_path, with_suffix};
use super::repo::{RepoId, RepoType};
use crate::checksum;
use crate::fetcher::{FetchError, SnapshotFetcher, SnapshotOptions};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Counters for one snapshot attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotStats {
    pub files: usize,
    pub downloaded: usize,
    pub skipped: usize,
    /// Bytes received over the network (resumed bytes excluded).
    pub bytes: u64,
}

enum FileStatus {
    Skipped,
    Downloaded(FileTransfer),
}

/// [`SnapshotFetcher`] backed by a [`HubClient`].
pub struct HubSnapshotFetcher {
    client: HubClient,
    repo_type: RepoType,
    revision: String,
    verify_checksums: bool,
    last_stats: SnapshotStats,
}

impl HubSnapshotFetcher {
    pub fn new(client: HubClient, repo_type: RepoType, revision: impl Into<String>) -> Self {
        Self {
            client,
            repo_type,
            revision: revision.into(),
            verify_checksums: true,
            last_stats: SnapshotStats::default(),
        }
    }

    pub fn with_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// Counters of the most recent attempt (partial if it failed).
    pub fn last_stats(&self) -> SnapshotStats {
        self.last_stats
    }

    fn fetch_file(
        &self,
        repo: &RepoId,
        commit: &str,
        sibling: &Sibling,
        opts: &SnapshotOptions,
        cache: &Path,
    ) -> Result<FileStatus, FetchError> {
        let rel = safe_relative_path(&sibling.rfilename).ok_or_else(|| {
            FetchError::Storage(format!(
                "refusing unsafe path in listing: {:?}",
                sibling.rfilename
            ))
        })?;
        let dest = opts.local_dir.join(&rel);

        if !opts.force_download {
            if let (Ok(meta), Some(expected)) = (fs::metadata(&dest), sibling.expected_size()) {
                if meta.is_file() && meta.len() == expected {
                    tracing::debug!("{} present, skipping", rel.display());
                    return Ok(FileStatus::Skipped);
                }
            }
        }

        let partial = partial_path(cache, &rel, commit);
        create_parent(&partial)?;
        create_parent(&dest)?;
        if !opts.resume && partial.exists() {
            fs::remove_file(&partial).map_err(|e| io_to_fetch_error(&partial, e))?;
        }

        let url = self
            .client
            .endpoint()
            .resolve_url(repo, commit, &sibling.rfilename);
        tracing::info!("downloading {}", sibling.rfilename);
        let transfer = self
            .client
            .download_file(url.as_str(), &partial, opts.resume, sibling.expected_size())
            .map_err(|e| transfer_to_fetch_error(&format!("download {}", sibling.rfilename), e))?;

        if self.verify_checksums {
            if let Some(lfs) = &sibling.lfs {
                let ok = checksum::matches_sha256(&partial, &lfs.sha256)
                    .map_err(|e| FetchError::Storage(format!("{:#}", e)))?;
                if !ok {
                    if let Err(e) = fs::remove_file(&partial) {
                        tracing::warn!("could not remove {}: {}", partial.display(), e);
                    }
                    return Err(FetchError::Transient(format!(
                        "checksum mismatch for {}",
                        sibling.rfilename
                    )));
                }
                tracing::debug!("verified sha256 of {}", sibling.rfilename);
            }
        }

        move_into_place(&partial, &dest)?;
        let metadata = with_suffix(cache, &rel, ".metadata");
        write_metadata(&metadata, commit, transfer.etag.as_deref())?;
        Ok(FileStatus::Downloaded(transfer))
    }
}

impl SnapshotFetcher for HubSnapshotFetcher {
    fn fetch_snapshot(
        &mut self,
        target: &str,
        opts: &SnapshotOptions,
    ) -> Result<PathBuf, FetchError> {
        let repo = RepoId::new(target, self.repo_type, self.revision.clone());
        let info = self.client.repo_info(&repo)?;
        let commit = info.sha.clone().unwrap_or_else(|| repo.revision.clone());
        tracing::info!(
            files = info.siblings.len(),
            total_bytes = info.total_size(),
            "{} resolved to commit {}",
            repo,
            commit
        );

        fs::create_dir_all(&opts.local_dir).map_err(|e| io_to_fetch_error(&opts.local_dir, e))?;
        let cache = download_cache_dir(&opts.cache_dir);

        self.last_stats = SnapshotStats {
            files: info.siblings.len(),
            ..SnapshotStats::default()
        };
        for sibling in &info.siblings {
            match self.fetch_file(&repo, &commit, sibling, opts, &cache)? {
                FileStatus::Skipped => self.last_stats.skipped += 1,
                FileStatus::Downloaded(t) => {
                    self.last_stats.downloaded += 1;
                    self.last_stats.bytes += t.size - t.resumed_from;
                }
            }
        }

        tracing::info!(
            downloaded = self.last_stats.downloaded,
            skipped = self.last_stats.skipped,
            bytes = self.last_stats.bytes,
            "snapshot of {} complete",
            repo
        );
        Ok(opts.local_dir.clone())
    }
}

fn create_parent(path: &Path) -> Result<(), FetchError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_to_fetch_error(parent, e))?;
    }
    Ok(())
}

/// Renames the finished file over `dest`, copying when the rename crosses filesystems.
fn move_into_place(partial: &Path, dest: &Path) -> Result<(), FetchError> {
    if dest.is_file() {
        fs::remove_file(dest).map_err(|e| io_to_fetch_error(dest, e))?;
    }
    if fs::rename(partial, dest).is_ok() {
        return Ok(());
    }
    fs::copy(partial, dest).map_err(|e| io_to_fetch_error(dest, e))?;
    fs::remove_file(partial).map_err(|e| io_to_fetch_error(partial, e))?;
    Ok(())
}

/// Three lines: commit, etag (may be empty), unix timestamp.
fn write_metadata(path: &Path, commit: &str, etag: Option<&str>) -> Result<(), FetchError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    let body = format!("{}\n{}\n{}\n", commit, etag.unwrap_or(""), now);
    fs::write(path, body).map_err(|e| io_to_fetch_error(path, e))
}
