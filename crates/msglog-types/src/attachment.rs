use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A validated attachment name.
///
/// Attachment names double as file names inside a message's namespace
/// directory, so they must be a single non-empty path component.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AttachmentName(String);

impl AttachmentName {
    /// Validate a raw name.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TypeError> {
        let name = raw.into();
        let reason = if name.is_empty() {
            Some("name is empty")
        } else if name == "." || name == ".." {
            Some("name is a relative directory reference")
        } else if name.contains(['/', '\\']) {
            Some("name contains a path separator")
        } else if name.contains('\0') {
            Some("name contains a NUL byte")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(TypeError::InvalidAttachmentName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for AttachmentName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for AttachmentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AttachmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttachmentName({:?})", self.0)
    }
}

impl fmt::Display for AttachmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An attachment as submitted by a client, still in transport encoding.
///
/// Field names follow the client wire format: `file` carries the name and
/// `arrayBuffer` the base64-encoded bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAttachment {
    pub file: String,
    #[serde(rename = "arrayBuffer")]
    pub array_buffer: String,
}

impl RawAttachment {
    pub fn new(file: impl Into<String>, array_buffer: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            array_buffer: array_buffer.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_file_names() {
        for name in ["a.txt", "photo 1.png", ".hidden", "ünïcode.bin"] {
            assert_eq!(AttachmentName::parse(name).unwrap().as_str(), name);
        }
    }

    #[test]
    fn rejects_traversal_and_separators() {
        for name in ["", ".", "..", "../etc/passwd", "dir/file", "dir\\file"] {
            assert!(
                AttachmentName::parse(name).is_err(),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn deserialize_validates() {
        assert!(serde_json::from_str::<AttachmentName>("\"ok.txt\"").is_ok());
        assert!(serde_json::from_str::<AttachmentName>("\"../x\"").is_err());
    }

    #[test]
    fn raw_attachment_wire_names() {
        let raw: RawAttachment =
            serde_json::from_str(r#"{"file":"a.txt","arrayBuffer":"aGk="}"#).unwrap();
        assert_eq!(raw, RawAttachment::new("a.txt", "aGk="));
    }
}
