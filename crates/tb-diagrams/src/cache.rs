//! Diagram caching infrastructure.
//!
//! - [`DiagramCache`]: trait for cache implementations
//! - [`NullDiagramCache`]: no-op cache (disabled caching)
//! - [`FileDiagramCache`]: versioned directory store
//!
//! Entries are keyed by a content hash of everything that affects the rendered
//! output. The render id is not part of the key.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Diagram parameters for cache key computation.
#[derive(Debug, Clone, Copy)]
pub struct DiagramKey<'a> {
    /// Diagram source, as passed to the renderer.
    pub source: &'a str,
    /// Kroki endpoint (always "mermaid" for post bodies).
    pub endpoint: &'a str,
    /// Output format ("svg" or "png").
    pub format: &'a str,
    /// DPI used for rendering.
    pub dpi: u32,
}

impl DiagramKey<'_> {
    /// Hex SHA-256 of `"{endpoint}:{format}:{dpi}:{source}"`.
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let content = format!(
            "{}:{}:{}:{}",
            self.endpoint, self.format, self.dpi, self.source
        );
        hex::encode(Sha256::digest(content.as_bytes()))
    }
}

/// Storage for rendered diagram markup.
pub trait DiagramCache {
    /// Cached markup for `key`, if present.
    fn get(&self, key: DiagramKey<'_>) -> Option<String>;

    /// Store markup for `key`. Failures are logged, never returned.
    fn set(&self, key: DiagramKey<'_>, content: &str);
}

/// No-op cache. Always misses and discards stored content.
#[derive(Debug, Default)]
pub struct NullDiagramCache;

impl DiagramCache for NullDiagramCache {
    fn get(&self, _key: DiagramKey<'_>) -> Option<String> {
        None
    }

    fn set(&self, _key: DiagramKey<'_>, _content: &str) {}
}

/// File-based diagram cache.
///
/// Directory layout:
/// ```text
/// {root}/
/// +-- VERSION            # cache layout version
/// +-- {hash}.svg
/// +-- {hash}.png         # PNG data URI as text
/// ```
///
/// A missing or different `VERSION` wipes the directory on construction.
#[derive(Debug)]
pub struct FileDiagramCache {
    root: PathBuf,
}

impl FileDiagramCache {
    /// Open a cache at `root`, validating its version.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        validate_version(&root, version);
        Self { root }
    }

    fn entry_path(&self, key: DiagramKey<'_>) -> PathBuf {
        self.root
            .join(format!("{}.{}", key.compute_hash(), key.format))
    }
}

impl DiagramCache for FileDiagramCache {
    fn get(&self, key: DiagramKey<'_>) -> Option<String> {
        fs::read_to_string(self.entry_path(key)).ok()
    }

    fn set(&self, key: DiagramKey<'_>, content: &str) {
        let path = self.entry_path(key);
        if let Err(e) = fs::create_dir_all(&self.root) {
            tracing::warn!("failed to create cache directory: {e}");
            return;
        }
        if let Err(e) = fs::write(&path, content) {
            tracing::warn!("failed to write cache entry {}: {e}", path.display());
        }
    }
}

/// Validate the cache version, wiping the directory on mismatch.
fn validate_version(root: &Path, version: &str) {
    let version_file = root.join("VERSION");

    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => {
            tracing::debug!("cache version matches: {version}");
            return;
        }
        Ok(stored) => {
            tracing::info!(
                "cache version mismatch (stored={stored}, current={version}), wiping cache"
            );
        }
        Err(_) => {
            tracing::info!("no cache VERSION file found, initializing cache");
        }
    }

    if root.exists()
        && let Err(e) = fs::remove_dir_all(root)
    {
        tracing::warn!("failed to remove cache directory: {e}");
    }
    if let Err(e) = fs::create_dir_all(root) {
        tracing::warn!("failed to create cache directory: {e}");
        return;
    }
    if let Err(e) = fs::write(&version_file, version) {
        tracing::warn!("failed to write cache VERSION file: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::DEFAULT_DPI;
    use tempfile::TempDir;

    fn make_key<'a>(source: &'a str, format: &'a str) -> DiagramKey<'a> {
        DiagramKey {
            source,
            endpoint: "mermaid",
            format,
            dpi: DEFAULT_DPI,
        }
    }

    #[test]
    fn test_null_cache_always_misses() {
        let cache = NullDiagramCache;
        let key = make_key("graph TD\nA-->B", "svg");

        cache.set(key, "<svg></svg>");
        assert!(cache.get(key).is_none());
    }

    #[test]
    fn test_file_cache_round_trip() {
        let temp = TempDir::new().unwrap();
        let cache = FileDiagramCache::new(temp.path().join("diagrams"), "v1");

        let key_svg = make_key("graph TD\nA-->B", "svg");
        let key_png = DiagramKey {
            format: "png",
            ..key_svg
        };

        assert!(cache.get(key_svg).is_none());
        cache.set(key_svg, "<svg>test</svg>");
        assert_eq!(cache.get(key_svg), Some("<svg>test</svg>".to_owned()));
        assert!(cache.get(key_png).is_none());
    }

    #[test]
    fn test_file_cache_version_mismatch_wipes() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("diagrams");
        let key = make_key("pie", "svg");

        FileDiagramCache::new(root.clone(), "v1").set(key, "<svg>old</svg>");
        assert!(FileDiagramCache::new(root.clone(), "v1").get(key).is_some());

        let cache = FileDiagramCache::new(root.clone(), "v2");
        assert!(cache.get(key).is_none());
        assert_eq!(fs::read_to_string(root.join("VERSION")).unwrap(), "v2");
    }

    #[test]
    fn test_diagram_key_hash() {
        let key1 = make_key("graph TD", "svg");
        let key2 = make_key("graph TD", "svg");
        let key3 = make_key("graph LR", "svg");

        assert_eq!(key1.compute_hash(), key2.compute_hash());
        assert_ne!(key1.compute_hash(), key3.compute_hash());
        assert_eq!(key1.compute_hash().len(), 64);
    }

    #[test]
    fn test_diagram_key_hash_dpi_and_format_matter() {
        let key = make_key("graph TD", "svg");
        let key_96 = DiagramKey { dpi: 96, ..key };
        let key_png = DiagramKey {
            format: "png",
            ..key
        };

        assert_ne!(key.compute_hash(), key_96.compute_hash());
        assert_ne!(key.compute_hash(), key_png.compute_hash());
    }

    #[test]
    fn test_diagram_key_hash_format() {
        let key = make_key("graph TD", "svg");
        let expected = hex::encode(Sha256::digest(b"mermaid:svg:192:graph TD"));
        assert_eq!(key.compute_hash(), expected);
    }
}
