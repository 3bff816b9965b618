//! Blocking hub client on libcurl: repository listing and resumable file GETs.
//!
//! Every request is built from the explicit [`HubClientConfig`]; proxy and
//! credentials never come from mutated process state. Each request is wrapped
//! in the transport [`RetryPolicy`].

use super::error::transfer_to_fetch_error;
use super::info::RepoInfo;
use super::repo::{HubEndpoint, RepoId};
use crate::fetcher::FetchError;
use crate::proxy::ProxyConfig;
use crate::retry::{run_with_retry, RetryPolicy, TransferError};
use anyhow::Result;
use std::cell::{Cell, RefCell};
use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use std::str;
use std::time::Duration;

const USER_AGENT: &str = concat!("hubfetch/", env!("CARGO_PKG_VERSION"));

/// Listing responses above this size are treated as broken.
const MAX_API_BODY: usize = 64 * 1024 * 1024;

/// Settings for every request the client makes.
#[derive(Debug, Clone)]
pub struct HubClientConfig {
    /// Hub base URL.
    pub endpoint: String,
    /// Proxy for both http and https traffic; `None` leaves curl's defaults.
    pub proxy: Option<ProxyConfig>,
    /// Bearer token for private or gated repositories.
    pub token: Option<String>,
    pub connect_timeout: Duration,
    /// Hard timeout for API (listing) requests. File downloads have none.
    pub api_timeout: Duration,
    /// Abort a transfer that stays below this many bytes/s for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    /// Per-request retry policy.
    pub retry: RetryPolicy,
}

impl Default for HubClientConfig {
    fn default() -> Self {
        Self {
            endpoint: crate::config::DEFAULT_ENDPOINT.to_string(),
            proxy: None,
            token: None,
            connect_timeout: Duration::from_secs(30),
            api_timeout: Duration::from_secs(60),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

/// A file transfer that ended with the whole file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTransfer {
    /// Length of the file after the transfer.
    pub size: u64,
    /// Offset the transfer continued from (0 for a fresh download).
    pub resumed_from: u64,
    /// ETag of the content, preferring the hub's `X-Linked-Etag` for LFS files.
    pub etag: Option<String>,
}

pub struct HubClient {
    endpoint: HubEndpoint,
    config: HubClientConfig,
}

impl HubClient {
    pub fn new(config: HubClientConfig) -> Result<Self> {
        let endpoint = HubEndpoint::parse(&config.endpoint)?;
        if let Some(proxy) = &config.proxy {
            tracing::info!(http = %proxy.http, https = %proxy.https, "hub client using proxy");
        }
        Ok(Self { endpoint, config })
    }

    pub fn endpoint(&self) -> &HubEndpoint {
        &self.endpoint
    }

    /// Common handle setup: redirects, timeouts, proxy, auth, user agent.
    fn easy(&self, url: &str) -> Result<curl::easy::Easy, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.useragent(USER_AGENT)?;
        easy.connect_timeout(self.config.connect_timeout)?;
        easy.low_speed_limit(self.config.low_speed_limit)?;
        easy.low_speed_time(self.config.low_speed_time)?;
        if let Some(proxy) = &self.config.proxy {
            easy.proxy(proxy.for_url(url))?;
        }
        if let Some(token) = self.config.token.as_deref().filter(|t| !t.is_empty()) {
            let mut list = curl::easy::List::new();
            list.append(&format!("Authorization: Bearer {}", token.trim()))?;
            easy.http_headers(list)?;
        }
        Ok(easy)
    }

    /// One GET into memory; non-2xx is an error.
    fn get_bytes_once(&self, url: &str) -> Result<Vec<u8>, TransferError> {
        let mut body = Vec::new();
        let mut easy = self.easy(url)?;
        easy.timeout(self.config.api_timeout)?;
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                if body.len() + data.len() > MAX_API_BODY {
                    return Ok(0);
                }
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }
        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(TransferError::Http(code));
        }
        Ok(body)
    }

    /// GET with the transport retry policy.
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransferError> {
        run_with_retry(&self.config.retry, || self.get_bytes_once(url))
    }

    /// Lists the files of `repo` at its revision.
    pub fn repo_info(&self, repo: &RepoId) -> Result<RepoInfo, FetchError> {
        let url = self.endpoint.info_url(repo);
        tracing::debug!("listing {} via {}", repo, url);
        let body = self
            .get_bytes(url.as_str())
            .map_err(|e| transfer_to_fetch_error(&format!("list {}", repo), e))?;
        RepoInfo::from_json(&body).map_err(|e| {
            FetchError::Transient(format!("list {}: invalid listing response: {}", repo, e))
        })
    }

    /// Downloads `url` into `partial`, continuing from its current length when
    /// `resume` is set. With `expected_size`, a partial file that already has
    /// that length is taken as complete and a mismatched result is an error.
    pub fn download_file(
        &self,
        url: &str,
        partial: &Path,
        resume: bool,
        expected_size: Option<u64>,
    ) -> Result<FileTransfer, TransferError> {
        if resume {
            if let (Some(expected), Ok(meta)) = (expected_size, fs::metadata(partial)) {
                if meta.len() == expected {
                    tracing::debug!("{} already complete ({} bytes)", partial.display(), expected);
                    return Ok(FileTransfer {
                        size: expected,
                        resumed_from: expected,
                        etag: None,
                    });
                }
                if meta.len() > expected {
                    tracing::warn!(
                        "{} is larger than expected ({} > {}); restarting",
                        partial.display(),
                        meta.len(),
                        expected
                    );
                    fs::remove_file(partial)?;
                }
            }
        }

        let result = run_with_retry(&self.config.retry, || {
            self.download_once(url, partial, resume, expected_size)
        });
        match result {
            Err(TransferError::Http(416)) if resume => {
                tracing::warn!("range not satisfiable for {}; restarting from zero", url);
                restart_from_zero(partial)?;
                run_with_retry(&self.config.retry, || {
                    self.download_once(url, partial, false, expected_size)
                })
            }
            // curl refuses a 200 reply to a resumed request before any body arrives.
            Err(TransferError::Curl(e)) if resume && e.is_range_error() => {
                tracing::warn!("{} does not honor byte ranges; restarting from zero", url);
                restart_from_zero(partial)?;
                run_with_retry(&self.config.retry, || {
                    self.download_once(url, partial, false, expected_size)
                })
            }
            other => other,
        }
    }

    fn download_once(
        &self,
        url: &str,
        partial: &Path,
        resume: bool,
        expected_size: Option<u64>,
    ) -> Result<FileTransfer, TransferError> {
        let offset = if resume {
            fs::metadata(partial).map(|m| m.len()).unwrap_or(0)
        } else {
            0
        };
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(offset == 0)
            .open(partial)?;
        file.seek(SeekFrom::Start(offset))?;

        let mut easy = self.easy(url)?;
        if offset > 0 {
            tracing::info!("resuming {} from byte {}", partial.display(), offset);
            easy.resume_from(offset)?;
        }

        let status = Cell::new(0u32);
        let etag: RefCell<Option<String>> = RefCell::new(None);
        let linked_etag: RefCell<Option<String>> = RefCell::new(None);
        let write_error: RefCell<Option<std::io::Error>> = RefCell::new(None);
        let mut written = 0u64;

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(line) = str::from_utf8(data) {
                    let line = line.trim_end();
                    if let Some(code) = parse_status_line(line) {
                        // New response (after a redirect): its headers replace the last ones.
                        status.set(code);
                        etag.borrow_mut().take();
                    } else if let Some((name, value)) = line.split_once(':') {
                        let name = name.trim();
                        if name.eq_ignore_ascii_case("x-linked-etag") {
                            *linked_etag.borrow_mut() = Some(clean_etag(value));
                        } else if name.eq_ignore_ascii_case("etag") {
                            *etag.borrow_mut() = Some(clean_etag(value));
                        }
                    }
                }
                true
            })?;
            transfer.write_function(|data| {
                let code = status.get();
                if !(200..300).contains(&code) {
                    // Redirect or error body; not part of the file.
                    return Ok(data.len());
                }
                match file.write_all(data) {
                    Ok(()) => {
                        written += data.len() as u64;
                        Ok(data.len())
                    }
                    Err(e) => {
                        write_error.borrow_mut().replace(e);
                        Ok(0) // abort transfer
                    }
                }
            })?;
            if let Err(e) = transfer.perform() {
                if e.is_write_error() {
                    if let Some(io_err) = write_error.borrow_mut().take() {
                        return Err(TransferError::Storage(io_err));
                    }
                }
                return Err(TransferError::Curl(e));
            }
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(TransferError::Http(code));
        }
        file.flush()?;

        let resumed_from = if code == 206 { offset } else { 0 };
        let size = resumed_from + written;
        if let Some(expected) = expected_size {
            if size != expected {
                if size > expected {
                    drop(file);
                    fs::remove_file(partial)?;
                }
                return Err(TransferError::PartialTransfer {
                    expected,
                    received: size,
                });
            }
        }

        let etag = linked_etag.into_inner().or_else(|| etag.into_inner());
        Ok(FileTransfer {
            size,
            resumed_from,
            etag,
        })
    }
}

fn restart_from_zero(partial: &Path) -> Result<(), TransferError> {
    if partial.exists() {
        fs::remove_file(partial)?;
    }
    Ok(())
}

/// Status code from a response line such as `HTTP/1.1 206 Partial Content`.
fn parse_status_line(line: &str) -> Option<u32> {
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}

fn clean_etag(value: &str) -> String {
    let v = value.trim();
    let v = v.strip_prefix("W/").unwrap_or(v);
    v.trim_matches('"').to_string()
}
