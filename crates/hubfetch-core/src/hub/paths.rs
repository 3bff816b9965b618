//! Local layout for downloaded files.
//!
//! Files land at `{local_dir}/{rfilename}`. Partial downloads and metadata
//! live under `{cache_dir}/.cache/huggingface/download/`.

use std::path::{Component, Path, PathBuf};

const DOWNLOAD_CACHE: [&str; 3] = [".cache", "huggingface", "download"];

/// Converts a hub `rfilename` into a relative path that stays inside the
/// destination. Returns `None` for empty, absolute, or `..`-containing names.
pub fn safe_relative_path(rfilename: &str) -> Option<PathBuf> {
    if rfilename.is_empty()
        || rfilename.starts_with('/')
        || rfilename.contains('\0')
        || rfilename.contains('\\')
    {
        return None;
    }
    let mut out = PathBuf::new();
    for part in rfilename.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        let mut comps = Path::new(part).components();
        match (comps.next(), comps.next()) {
            (Some(Component::Normal(c)), None) => out.push(c),
            _ => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Directory holding `.incomplete` and `.metadata` files.
pub fn download_cache_dir(cache_dir: &Path) -> PathBuf {
    DOWNLOAD_CACHE.iter().fold(cache_dir.to_path_buf(), |p, c| p.join(c))
}

/// `{dir}/{rel}{suffix}`, e.g. `.../data/train.parquet.incomplete`.
pub fn with_suffix(dir: &Path, rel: &Path, suffix: &str) -> PathBuf {
    let mut name = dir.join(rel).into_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Partial download for `rel` at `commit`: `{dir}/{rel}.{commit}.incomplete`.
///
/// Keyed by commit so bytes from another revision are never resumed into.
pub fn partial_path(dir: &Path, rel: &Path, commit: &str) -> PathBuf {
    let key: String = commit
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    with_suffix(dir, rel, &format!(".{}.incomplete", key))
}
