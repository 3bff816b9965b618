//! Repository identity and hub URL layout.

use anyhow::{Context, Result};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Kind of hub repository; decides the URL prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepoType {
    Model,
    #[default]
    Dataset,
    Space,
}

impl RepoType {
    /// Path segment used by the JSON API (`/api/{segment}/...`).
    pub fn api_segment(self) -> &'static str {
        match self {
            RepoType::Model => "models",
            RepoType::Dataset => "datasets",
            RepoType::Space => "spaces",
        }
    }

    /// Prefix segment for file URLs; models have none.
    pub fn url_prefix(self) -> Option<&'static str> {
        match self {
            RepoType::Model => None,
            RepoType::Dataset => Some("datasets"),
            RepoType::Space => Some("spaces"),
        }
    }
}

impl fmt::Display for RepoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RepoType::Model => "model",
            RepoType::Dataset => "dataset",
            RepoType::Space => "space",
        };
        f.write_str(s)
    }
}

impl FromStr for RepoType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "model" | "models" => Ok(RepoType::Model),
            "dataset" | "datasets" => Ok(RepoType::Dataset),
            "space" | "spaces" => Ok(RepoType::Space),
            other => Err(format!(
                "unknown repo type '{}' (expected model, dataset or space)",
                other
            )),
        }
    }
}

/// A repository at a given revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    /// `org/name` (or a bare `name` for legacy repos).
    pub repo_id: String,
    pub repo_type: RepoType,
    /// Branch, tag or commit sha.
    pub revision: String,
}

impl RepoId {
    pub fn new(repo_id: impl Into<String>, repo_type: RepoType, revision: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            repo_type,
            revision: revision.into(),
        }
    }

    fn id_segments(&self) -> impl Iterator<Item = &str> {
        self.repo_id.split('/').filter(|s| !s.is_empty())
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}@{}", self.repo_type, self.repo_id, self.revision)
    }
}

/// Base URL of a hub (e.g. `https://huggingface.co` or a mirror with a path prefix).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubEndpoint(Url);

impl HubEndpoint {
    /// Parses and checks that the URL is an http(s) base usable for path joins.
    pub fn parse(endpoint: &str) -> Result<Self> {
        let url = Url::parse(endpoint.trim())
            .with_context(|| format!("invalid hub endpoint: {}", endpoint))?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("hub endpoint must be an http(s) URL: {}", endpoint);
        }
        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Appends `segments` to the endpoint path, percent-encoding each one.
    fn join<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.0.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `GET` target returning the repo listing at `repo.revision`, with LFS metadata.
    pub fn info_url(&self, repo: &RepoId) -> Url {
        let mut segments = vec!["api", repo.repo_type.api_segment()];
        segments.extend(repo.id_segments());
        segments.push("revision");
        segments.push(repo.revision.as_str());
        let mut url = self.join(segments);
        url.set_query(Some("blobs=true"));
        url
    }

    /// Download URL for `filename` at `revision` (a commit sha when known).
    pub fn resolve_url(&self, repo: &RepoId, revision: &str, filename: &str) -> Url {
        let mut segments: Vec<&str> = repo.repo_type.url_prefix().into_iter().collect();
        segments.extend(repo.id_segments());
        segments.push("resolve");
        segments.push(revision);
        segments.extend(filename.split('/'));
        self.join(segments)
    }
}
