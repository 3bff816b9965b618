//! Repository listing returned by the hub JSON API.

use serde::Deserialize;

/// Listing of a repository at one revision.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoInfo {
    /// Canonical `org/name`.
    #[serde(default)]
    pub id: Option<String>,
    /// Commit the revision resolved to.
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub siblings: Vec<Sibling>,
}

/// One file in the repository.
#[derive(Debug, Clone, Deserialize)]
pub struct Sibling {
    /// Path relative to the repository root, `/`-separated.
    pub rfilename: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub lfs: Option<LfsInfo>,
}

/// LFS pointer metadata, present for large files.
#[derive(Debug, Clone, Deserialize)]
pub struct LfsInfo {
    pub sha256: String,
    pub size: u64,
}

impl Sibling {
    /// Size of the downloaded file, preferring the LFS size.
    pub fn expected_size(&self) -> Option<u64> {
        self.lfs.as_ref().map(|l| l.size).or(self.size)
    }
}

impl RepoInfo {
    pub fn from_json(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }

    /// Total bytes announced by the listing (files without a size count as 0).
    pub fn total_size(&self) -> u64 {
        self.siblings
            .iter()
            .filter_map(Sibling::expected_size)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{
        "_id": "66f0",
        "id": "org/data",
        "sha": "4f3c2a1b",
        "private": false,
        "siblings": [
            {"rfilename": ".gitattributes", "blobId": "aa", "size": 2307},
            {"rfilename": "README.md", "size": 120},
            {
                "rfilename": "data/train-00000.parquet",
                "size": 1048576,
                "lfs": {"sha256": "ab12", "size": 1048576, "pointerSize": 134}
            }
        ]
    }"#;

    #[test]
    fn parses_listing_and_ignores_unknown_fields() {
        let info = RepoInfo::from_json(LISTING.as_bytes()).unwrap();
        assert_eq!(info.id.as_deref(), Some("org/data"));
        assert_eq!(info.sha.as_deref(), Some("4f3c2a1b"));
        assert_eq!(info.siblings.len(), 3);
        let lfs = info.siblings[2].lfs.as_ref().unwrap();
        assert_eq!(lfs.sha256, "ab12");
        assert_eq!(info.total_size(), 2307 + 120 + 1048576);
    }

    #[test]
    fn minimal_listing_without_blobs() {
        let info = RepoInfo::from_json(br#"{"siblings":[{"rfilename":"a.txt"}]}"#).unwrap();
        assert!(info.sha.is_none());
        assert_eq!(info.siblings[0].expected_size(), None);
        assert_eq!(info.total_size(), 0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(RepoInfo::from_json(b"<html>rate limited</html>").is_err());
    }
}
