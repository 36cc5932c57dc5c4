//! Durable storage for a built [`Index`]
//!
//! An index lives in a directory holding two files:
//!
//! - `manifest.json`: format version, embedding model, dimension, metric,
//!   entry count, the SHA-256 of `entries.json` and the build time
//! - `entries.json`: the ordered `{ vector, chunk }` entries
//!
//! Saves are written into a sibling staging directory and swapped into place
//! only once both files are on disk, so a reader sees either the previous
//! index or the new one. Loads verify the checksum and every structural fact
//! recorded in the manifest before handing the index out.

use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{ErrorKind, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{DistanceMetric, Index, IndexEntry, RagError};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const ENTRIES_FILE: &str = "entries.json";
pub const FORMAT_VERSION: u32 = 1;

/// Facts about a persisted index, stored next to its entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub embedding_model: String,
    pub dimension: usize,
    pub metric: DistanceMetric,
    pub entry_count: usize,
    /// Hex SHA-256 of the entries file
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

/// Exclusive right to write an index location
///
/// Backed by an advisory lock on a `<location>.lock` file beside the index
/// directory. The operating system drops the lock when the holder exits, so
/// a lock file left behind by a killed build never blocks the next one. The
/// file itself stays in place between builds.
#[derive(Debug)]
pub struct BuildLock {
    location: PathBuf,
    lock_path: PathBuf,
    _file: File,
}

impl BuildLock {
    pub fn acquire(location: &Path) -> Result<Self, RagError> {
        let lock_path = sibling(location, "", ".lock")?;

        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| RagError::index_write(display(location), e.to_string()))?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| RagError::index_write(display(location), e.to_string()))?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                return Err(RagError::index_locked(display(location)));
            }
            Err(TryLockError::Error(e)) => {
                return Err(RagError::index_write(display(location), e.to_string()));
            }
        }

        // Holder pid, informational only
        if let Err(e) = record_holder(&mut file) {
            tracing::debug!(lock = %lock_path.display(), error = %e, "Could not record lock holder");
        }

        tracing::debug!(lock = %lock_path.display(), "Acquired index build lock");

        Ok(Self {
            location: location.to_path_buf(),
            lock_path,
            _file: file,
        })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        tracing::debug!(lock = %self.lock_path.display(), "Released index build lock");
    }
}

fn record_holder(file: &mut File) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())
}

/// `<parent>/<prefix><name><suffix>` for an index location
fn sibling(location: &Path, prefix: &str, suffix: &str) -> Result<PathBuf, RagError> {
    let name = location.file_name().ok_or_else(|| {
        RagError::configuration(format!(
            "Index location '{}' must name a directory",
            location.display()
        ))
    })?;

    let mut file_name = std::ffi::OsString::from(prefix);
    file_name.push(name);
    file_name.push(suffix);

    Ok(location.with_file_name(file_name))
}

/// Reads and writes indexes, checking loads against the embedding
/// configuration queries will use
#[derive(Debug, Clone)]
pub struct IndexStore {
    embedding_model: String,
    dimension: Option<usize>,
}

impl IndexStore {
    /// `dimension` is the embedding dimension the current provider reports
    /// for `embedding_model`, when known
    pub fn new(embedding_model: impl Into<String>, dimension: Option<usize>) -> Self {
        Self {
            embedding_model: embedding_model.into(),
            dimension,
        }
    }

    pub async fn save(&self, lock: &BuildLock, index: &Index) -> Result<IndexManifest, RagError> {
        let location = lock.location().to_path_buf();
        let write_error = |e: &dyn std::fmt::Display| RagError::index_write(display(&location), e.to_string());

        let entries = serde_json::to_vec(index.entries()).map_err(|e| write_error(&e))?;

        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            embedding_model: index.embedding_model().to_string(),
            dimension: index.dimension(),
            metric: index.metric(),
            entry_count: index.len(),
            checksum: checksum(&entries),
            created_at: Utc::now(),
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest).map_err(|e| write_error(&e))?;

        let target = location.clone();
        tokio::task::spawn_blocking(move || write_atomically(&target, &manifest_bytes, &entries))
            .await
            .map_err(|e| write_error(&e))??;

        tracing::info!(
            location = %location.display(),
            entry_count = manifest.entry_count,
            dimension = manifest.dimension,
            metric = %manifest.metric,
            "Saved index"
        );

        Ok(manifest)
    }

    pub async fn load(&self, location: &Path) -> Result<Index, RagError> {
        let store = self.clone();
        let target = location.to_path_buf();

        let index = tokio::task::spawn_blocking(move || store.load_blocking(&target))
            .await
            .map_err(|e| RagError::index_corrupt(display(location), format!("Load task failed: {}", e)))??;

        tracing::info!(
            location = %location.display(),
            entry_count = index.len(),
            dimension = index.dimension(),
            "Loaded index"
        );

        Ok(index)
    }

    fn load_blocking(&self, location: &Path) -> Result<Index, RagError> {
        let loc = display(location);
        let corrupt = |message: String| RagError::index_corrupt(&loc, message);

        let manifest_path = location.join(MANIFEST_FILE);
        let manifest_bytes = match fs::read(&manifest_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RagError::index_not_found(
                    &loc,
                    "No index has been built at this location",
                ));
            }
            Err(e) => return Err(corrupt(format!("Cannot read manifest: {}", e))),
        };

        let manifest: IndexManifest = serde_json::from_slice(&manifest_bytes)
            .map_err(|e| corrupt(format!("Unreadable manifest: {}", e)))?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(corrupt(format!(
                "Unsupported format version {} (expected {})",
                manifest.format_version, FORMAT_VERSION
            )));
        }

        if manifest.embedding_model != self.embedding_model {
            return Err(corrupt(format!(
                "Index was built with embedding model '{}' but '{}' is configured",
                manifest.embedding_model, self.embedding_model
            )));
        }

        if let Some(dimension) = self.dimension.filter(|d| *d != manifest.dimension) {
            return Err(corrupt(format!(
                "Index dimension {} does not match embedding dimension {}",
                manifest.dimension, dimension
            )));
        }

        let entries_bytes = fs::read(location.join(ENTRIES_FILE))
            .map_err(|e| corrupt(format!("Cannot read entries: {}", e)))?;

        if checksum(&entries_bytes) != manifest.checksum {
            return Err(corrupt("Entries checksum does not match manifest".to_string()));
        }

        let entries: Vec<IndexEntry> = serde_json::from_slice(&entries_bytes)
            .map_err(|e| corrupt(format!("Unreadable entries: {}", e)))?;

        if entries.len() != manifest.entry_count {
            return Err(corrupt(format!(
                "Manifest lists {} entries but {} were stored",
                manifest.entry_count,
                entries.len()
            )));
        }

        let index = Index::new(manifest.embedding_model, manifest.metric, entries)
            .map_err(|e| corrupt(e.to_string()))?;

        if index.dimension() != manifest.dimension {
            return Err(corrupt(format!(
                "Stored vectors have dimension {} but manifest records {}",
                index.dimension(),
                manifest.dimension
            )));
        }

        Ok(index)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn write_atomically(location: &Path, manifest: &[u8], entries: &[u8]) -> Result<(), RagError> {
    let loc = display(location);
    let write_error = |message: String| RagError::index_write(&loc, message);
    let build_id = uuid::Uuid::new_v4();

    let staging = sibling(location, ".", &format!(".staging-{}", build_id))?;
    let previous = sibling(location, ".", &format!(".old-{}", build_id))?;

    let staged = fs::create_dir_all(&staging)
        .and_then(|_| write_file(&staging.join(ENTRIES_FILE), entries))
        .and_then(|_| write_file(&staging.join(MANIFEST_FILE), manifest));

    if let Err(e) = staged {
        let _ = fs::remove_dir_all(&staging);
        return Err(write_error(format!("Failed to stage index: {}", e)));
    }

    let had_previous = location.exists();
    if had_previous {
        if let Err(e) = fs::rename(location, &previous) {
            let _ = fs::remove_dir_all(&staging);
            return Err(write_error(format!("Failed to move previous index aside: {}", e)));
        }
    }

    if let Err(e) = fs::rename(&staging, location) {
        if had_previous {
            let _ = fs::rename(&previous, location);
        }
        let _ = fs::remove_dir_all(&staging);
        return Err(write_error(format!("Failed to move new index into place: {}", e)));
    }

    if had_previous {
        if let Err(e) = fs::remove_dir_all(&previous) {
            tracing::warn!(path = %previous.display(), error = %e, "Failed to remove previous index");
        }
    }

    sync_parent(location);
    Ok(())
}

/// Flush the directory entry of `path` so the rename survives a crash
#[cfg(unix)]
fn sync_parent(path: &Path) {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    if let Err(e) = File::open(parent).and_then(|dir| dir.sync_all()) {
        tracing::debug!(path = %parent.display(), error = %e, "Could not sync index parent directory");
    }
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) {}
