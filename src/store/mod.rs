// src/store/mod.rs
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::debug;

/// The artifacts one pipeline run produces, keyed together with a digest
/// year tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Raw HTML of the digest tables-menu page.
    TablesMenu,
    /// Raw HTML of the per-pupil expenditure table page.
    ExpenditureTable,
    /// Cleaned table, Parquet-encoded.
    CleanTable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactKey {
    pub year_tag: String,
    pub kind: ArtifactKind,
}

impl ArtifactKey {
    pub fn new(year_tag: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            year_tag: year_tag.into(),
            kind,
        }
    }

    /// Deterministic storage path: raw artifacts under `raw/`, derived ones
    /// under `clean/`.
    pub fn relative_path(&self) -> PathBuf {
        match self.kind {
            ArtifactKind::TablesMenu => format!("raw/tables_menu_{}.html", self.year_tag),
            ArtifactKind::ExpenditureTable => {
                format!("raw/per_pupil_expenditure_{}.html", self.year_tag)
            }
            ArtifactKind::CleanTable => {
                format!("clean/per_pupil_expenditure_{}.parquet", self.year_tag)
            }
        }
        .into()
    }
}

/// Existence-keyed artifact cache. `get` returning `Ok(None)` is the signal
/// to fetch and `put`; there is no staleness policy beyond presence.
pub trait ArtifactStore {
    fn get(&self, key: &ArtifactKey) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<()>;
}

/// Filesystem store rooted at a data directory. The `raw/` and `clean/`
/// subdirectories are created on first write.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(key.relative_path())
    }
}

impl ArtifactStore for FsStore {
    fn get(&self, key: &ArtifactKey) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read(&path)
            .map(Some)
            .with_context(|| format!("reading cached artifact {}", path.display()))
    }

    fn put(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        // Write to a temporary path first, then rename over the destination.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;
        debug!(path = %path.display(), bytes = bytes.len(), "stored artifact");
        Ok(())
    }
}

/// In-memory store for tests and dry runs.
#[derive(Default)]
pub struct MemStore {
    map: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &ArtifactKey) -> bool {
        self.map.lock().unwrap().contains_key(&key.relative_path())
    }
}

impl ArtifactStore for MemStore {
    fn get(&self, key: &ArtifactKey) -> Result<Option<Vec<u8>>> {
        Ok(self.map.lock().unwrap().get(&key.relative_path()).cloned())
    }

    fn put(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<()> {
        self.map
            .lock()
            .unwrap()
            .insert(key.relative_path(), bytes.to_vec());
        Ok(())
    }
}
