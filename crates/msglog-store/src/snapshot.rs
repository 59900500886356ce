use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use msglog_types::Message;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// Durable home of the message log's snapshot.
///
/// All implementations must satisfy these invariants:
/// - `save` replaces the whole previous snapshot; there are no partial
///   snapshots and no incremental appends.
/// - `load` returns an empty log when no snapshot has ever been saved.
/// - `load` fails, rather than returning a shorter log, when a snapshot
///   exists but cannot be decoded.
pub trait SnapshotBackend: Send + Sync {
    /// Read every message of the last saved snapshot, oldest first.
    fn load(&self) -> StoreResult<Vec<Message>>;

    /// Overwrite the snapshot with the given sequence.
    fn save(&self, messages: &[Arc<Message>]) -> StoreResult<()>;

    /// Short description for log lines.
    fn describe(&self) -> String;
}

/// Snapshot kept as one JSON array file, rewritten on every save.
///
/// Writes are plain whole-file overwrites without fsync or rename, so a crash
/// in the middle of a save can leave a truncated file. Such a file is then
/// rejected at load time instead of being silently dropped.
#[derive(Clone, Debug)]
pub struct JsonFileSnapshot {
    path: PathBuf,
}

impl JsonFileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotBackend for JsonFileSnapshot {
    fn load(&self) -> StoreResult<Vec<Message>> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no snapshot found, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let messages: Vec<Message> =
            serde_json::from_slice(&raw).map_err(|e| StoreError::CorruptSnapshot {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        info!(path = %self.path.display(), count = messages.len(), "snapshot loaded");
        Ok(messages)
    }

    fn save(&self, messages: &[Arc<Message>]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let records: Vec<&Message> = messages.iter().map(Arc::as_ref).collect();
        let bytes =
            serde_json::to_vec(&records).map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(&self.path, &bytes)?;
        debug!(path = %self.path.display(), count = records.len(), bytes = bytes.len(), "snapshot written");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}
