use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use msglog_types::{AttachmentName, MessageId};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Decode a base64 transport payload into raw bytes.
///
/// `name` only labels the error.
pub fn decode_payload(name: &str, encoded: &str) -> StoreResult<Vec<u8>> {
    BASE64_STANDARD
        .decode(encoded.trim())
        .map_err(|e| StoreError::Decode {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

/// Filesystem store for attachment bytes.
///
/// Layout: `<root>/<message id>/<attachment name>`. Each message owns one
/// namespace directory; names are unique within it, so two writers never
/// target the same file.
#[derive(Clone, Debug)]
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it is missing. Safe to call repeatedly
    /// and concurrently.
    pub fn ensure_namespace_ready(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Directory holding every attachment of `message_id`.
    pub fn namespace_dir(&self, message_id: MessageId) -> PathBuf {
        self.root.join(message_id.to_string())
    }

    /// Where the attachment lives. Does not check existence.
    pub fn resolve_path(&self, message_id: MessageId, name: &AttachmentName) -> PathBuf {
        self.namespace_dir(message_id).join(name.as_str())
    }

    /// Decode a base64 payload and store it.
    pub fn save(
        &self,
        message_id: MessageId,
        name: &AttachmentName,
        encoded: &str,
    ) -> StoreResult<PathBuf> {
        let bytes = decode_payload(name.as_str(), encoded)?;
        self.save_decoded(message_id, name, &bytes)
    }

    /// Store already decoded bytes, replacing any previous file of that name.
    pub fn save_decoded(
        &self,
        message_id: MessageId,
        name: &AttachmentName,
        bytes: &[u8],
    ) -> StoreResult<PathBuf> {
        fs::create_dir_all(self.namespace_dir(message_id))?;
        let path = self.resolve_path(message_id, name);
        fs::write(&path, bytes)?;
        debug!(message_id = %message_id, name = %name, bytes = bytes.len(), "attachment stored");
        Ok(path)
    }

    /// Read back the stored bytes.
    pub fn read(&self, message_id: MessageId, name: &AttachmentName) -> StoreResult<Vec<u8>> {
        fs::read(self.resolve_path(message_id, name)).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StoreError::AttachmentNotFound {
                    message_id,
                    name: name.to_string(),
                }
            } else {
                StoreError::Io(e)
            }
        })
    }

    /// Returns `true` if the attachment file exists.
    pub fn exists(&self, message_id: MessageId, name: &AttachmentName) -> bool {
        self.resolve_path(message_id, name).is_file()
    }
}
