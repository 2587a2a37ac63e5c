//! On-disk inventory cache
//!
//! Two JSON files per profile: the grouped inventory payload and the
//! endpoint index. A third file holds the tags-only projection when that
//! view is requested. A payload file is only trusted while it is younger
//! than the configured max-age AND the index file exists.

use super::{format_groups, Index, Inventory};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Which payload file a cache check or read targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Full,
    TagsOnly,
}

/// Paths and lifetime of the cache files.
#[derive(Debug, Clone)]
pub struct CacheStore {
    payload_path: PathBuf,
    tags_path: PathBuf,
    index_path: PathBuf,
    max_age: Duration,
}

impl CacheStore {
    /// `file_prefix` namespaces the files per AWS profile so switching
    /// profiles never serves another account's inventory.
    pub fn new(dir: &Path, max_age: Duration, file_prefix: &str) -> Self {
        Self {
            payload_path: dir.join(format!("{file_prefix}ec2inv.cache")),
            tags_path: dir.join(format!("{file_prefix}ec2inv.tags.cache")),
            index_path: dir.join(format!("{file_prefix}ec2inv.index")),
            max_age,
        }
    }

    fn payload_path(&self, kind: CacheKind) -> &Path {
        match kind {
            CacheKind::Full => &self.payload_path,
            CacheKind::TagsOnly => &self.tags_path,
        }
    }

    /// True only while the selected payload file is younger than max-age
    /// and the index file exists. A missing index always forces a refresh,
    /// however fresh the payload is.
    pub fn is_valid(&self, kind: CacheKind) -> bool {
        let Ok(meta) = fs::metadata(self.payload_path(kind)) else {
            return false;
        };
        let Ok(modified) = meta.modified() else {
            return false;
        };
        SystemTime::now() < modified + self.max_age && self.index_path.exists()
    }

    /// Serializes both maps to disk as pretty, key-sorted JSON.
    ///
    /// Whole-file overwrite with no lock and no atomic rename: a concurrent
    /// reader can observe a half-written file. Refreshes are expected to be
    /// serialized by the operator.
    pub fn write(&self, inventory: &Inventory, index: &Index, tags_only: bool) -> Result<()> {
        let kind = if tags_only {
            CacheKind::TagsOnly
        } else {
            CacheKind::Full
        };
        let path = self.payload_path(kind);
        let payload = format_groups(inventory, tags_only)?;
        fs::write(path, payload)
            .with_context(|| format!("failed to write cache payload {}", path.display()))?;

        let rendered = serde_json::to_string_pretty(index)?;
        fs::write(&self.index_path, rendered).with_context(|| {
            format!("failed to write cache index {}", self.index_path.display())
        })?;

        tracing::debug!("cache written to {}", path.display());
        Ok(())
    }

    /// Reads and deserializes the index file.
    pub fn load_index(&self) -> Result<Index> {
        let raw = fs::read_to_string(&self.index_path).with_context(|| {
            format!("failed to read cache index {}", self.index_path.display())
        })?;
        serde_json::from_str(&raw).with_context(|| {
            format!("cache index {} is not valid JSON", self.index_path.display())
        })
    }

    /// Returns the stored payload verbatim, skipping a pointless
    /// deserialize/re-serialize round trip on the list fast-path.
    pub fn load_payload(&self, kind: CacheKind) -> Result<String> {
        let path = self.payload_path(kind);
        fs::read_to_string(path)
            .with_context(|| format!("failed to read cache payload {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_maps() -> (Inventory, Index) {
        let mut inventory = Inventory::new();
        inventory.insert("us-east-1".to_string(), vec!["1.2.3.4".to_string()]);
        inventory.insert("tag_env_prod".to_string(), vec!["1.2.3.4".to_string()]);
        let mut index = Index::new();
        index.insert(
            "1.2.3.4".to_string(),
            ("us-east-1".to_string(), "i-0123456789".to_string()),
        );
        (inventory, index)
    }

    #[test]
    fn fresh_write_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path(), Duration::from_secs(300), "");
        let (inventory, index) = sample_maps();

        store.write(&inventory, &index, false).unwrap();

        assert!(store.is_valid(CacheKind::Full));
    }

    #[test]
    fn expired_payload_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path(), Duration::ZERO, "");
        let (inventory, index) = sample_maps();

        store.write(&inventory, &index, false).unwrap();

        assert!(!store.is_valid(CacheKind::Full));
    }

    #[test]
    fn deleting_the_index_alone_invalidates() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path(), Duration::from_secs(300), "");
        let (inventory, index) = sample_maps();
        store.write(&inventory, &index, false).unwrap();

        fs::remove_file(dir.path().join("ec2inv.index")).unwrap();

        assert!(!store.is_valid(CacheKind::Full));
    }

    #[test]
    fn index_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path(), Duration::from_secs(300), "");
        let (inventory, index) = sample_maps();

        store.write(&inventory, &index, false).unwrap();

        assert_eq!(store.load_index().unwrap(), index);
    }

    #[test]
    fn missing_index_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path(), Duration::from_secs(300), "");

        assert!(store.load_index().is_err());
    }

    #[test]
    fn payload_is_served_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path(), Duration::from_secs(300), "");
        let (inventory, index) = sample_maps();

        store.write(&inventory, &index, false).unwrap();

        assert_eq!(
            store.load_payload(CacheKind::Full).unwrap(),
            format_groups(&inventory, false).unwrap()
        );
    }

    #[test]
    fn tags_only_write_targets_the_tags_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path(), Duration::from_secs(300), "");
        let (inventory, index) = sample_maps();

        store.write(&inventory, &index, true).unwrap();

        assert!(store.is_valid(CacheKind::TagsOnly));
        assert!(!store.is_valid(CacheKind::Full));
        let names: Vec<String> =
            serde_json::from_str(&store.load_payload(CacheKind::TagsOnly).unwrap()).unwrap();
        assert_eq!(names, vec!["tag_env_prod"]);
    }

    #[test]
    fn profile_prefix_namespaces_the_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path(), Duration::from_secs(300), "staging-");
        let (inventory, index) = sample_maps();

        store.write(&inventory, &index, false).unwrap();

        assert!(dir.path().join("staging-ec2inv.cache").exists());
        assert!(dir.path().join("staging-ec2inv.index").exists());
    }
}
