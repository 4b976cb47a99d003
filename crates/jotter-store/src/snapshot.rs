//! Full-state snapshot writers.
//!
//! A snapshot is the whole [`Dataset`](crate::Dataset) serialized as one JSON
//! document with the keys `posts`, `comments` and `profile`. Every write
//! replaces the previous document entirely.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::dataset::{OwnedSnapshot, SnapshotDocument};
use crate::error::{StoreError, StoreResult};

const INDENT: &[u8] = b"    ";

/// Destination for full-state snapshots.
///
/// Implementations must be thread-safe. The [`Store`](crate::Store) calls
/// `write` while holding its lock, so writes never interleave.
pub trait SnapshotWriter: Send + Sync {
    /// Replace the persisted document with `document`.
    fn write(&self, document: &SnapshotDocument<'_>) -> StoreResult<()>;

    /// Read the persisted document back.
    ///
    /// Returns `Ok(None)` if nothing has been persisted yet.
    fn load(&self) -> StoreResult<Option<OwnedSnapshot>>;

    /// Human-readable location, used in log lines.
    fn location(&self) -> String;
}

/// Render a document the way it is stored on disk: four-space indentation
/// and a trailing newline.
pub fn render(document: &impl Serialize) -> StoreResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    document.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Snapshot writer backed by a JSON file.
///
/// Each write goes to a temporary file beside the target which is then
/// renamed over it, so readers see either the old or the new document.
#[derive(Clone, Debug)]
pub struct JsonFileSnapshot {
    path: PathBuf,
}

impl JsonFileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }
}

impl SnapshotWriter for JsonFileSnapshot {
    fn write(&self, document: &SnapshotDocument<'_>) -> StoreResult<()> {
        let bytes = render(document)?;

        let dir = self.parent_dir();
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            writer.write_all(&bytes)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "snapshot written");
        Ok(())
    }

    fn load(&self) -> StoreResult<Option<OwnedSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        let snapshot = serde_json::from_str(&text)?;
        Ok(Some(snapshot))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Snapshot writer that keeps the last document in memory.
///
/// Clones share the same slot, so a test can hand one clone to a store and
/// inspect the other.
#[derive(Clone, Debug, Default)]
pub struct MemorySnapshot {
    last: Arc<Mutex<Option<Value>>>,
    writes: Arc<Mutex<u64>>,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently written document.
    pub fn last(&self) -> Option<Value> {
        self.last.lock().ok().and_then(|slot| slot.clone())
    }

    /// How many writes have happened.
    pub fn write_count(&self) -> u64 {
        self.writes.lock().map(|n| *n).unwrap_or(0)
    }
}

impl SnapshotWriter for MemorySnapshot {
    fn write(&self, document: &SnapshotDocument<'_>) -> StoreResult<()> {
        let value = serde_json::to_value(document)?;
        *self.last.lock().map_err(|_| StoreError::Poisoned)? = Some(value);
        *self.writes.lock().map_err(|_| StoreError::Poisoned)? += 1;
        Ok(())
    }

    fn load(&self) -> StoreResult<Option<OwnedSnapshot>> {
        let slot = self.last.lock().map_err(|_| StoreError::Poisoned)?;
        slot.clone()
            .map(|value| serde_json::from_value(value).map_err(StoreError::from))
            .transpose()
    }

    fn location(&self) -> String {
        "memory".into()
    }
}
