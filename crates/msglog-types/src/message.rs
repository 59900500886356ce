use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::attachment::RawAttachment;
use crate::error::TypeError;
use crate::id::MessageId;
use crate::temporal::{DateTimeInput, MessageTimestamp};

/// Payload kind of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// `data` is UTF-8 text.
    Text,
    /// `data` is base64 of the raw audio bytes.
    Audio,
    /// `data` is base64 of the raw video bytes.
    Video,
}

impl MessageType {
    pub const ALL: [MessageType; 3] = [Self::Text, Self::Audio, Self::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    /// Returns `true` for kinds whose `data` carries binary media.
    pub fn is_media(&self) -> bool {
        matches!(self, Self::Audio | Self::Video)
    }
}

impl FromStr for MessageType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| TypeError::UnknownMessageType(s.to_string()))
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry of the append-only message log.
///
/// Immutable once appended. Field names on the wire and in the snapshot file
/// are camelCase (`clientId`, `dateTime`, `attachmentNames`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Originating client. Older snapshots do not carry it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub id: MessageId,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub data: String,
    pub date_time: MessageTimestamp,
    /// Names of the attachments stored under this message, in submission order.
    #[serde(default)]
    pub attachment_names: Vec<String>,
    /// Opaque geolocation payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<serde_json::Value>,
}

impl Message {
    /// Returns `true` if this is a text message whose data contains
    /// `needle_lowercase`, compared case-insensitively.
    ///
    /// The needle must already be lowercased.
    pub fn text_contains(&self, needle_lowercase: &str) -> bool {
        self.kind == MessageType::Text && self.data.to_lowercase().contains(needle_lowercase)
    }
}

/// A creation request as submitted by a client, before validation.
///
/// `kind` stays a string here so an unknown type is reported as a
/// validation failure instead of a body parse failure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: String,
    /// Missing means "now".
    #[serde(default)]
    pub date_time: Option<DateTimeInput>,
    #[serde(default)]
    pub attachments: Option<Vec<RawAttachment>>,
    #[serde(default)]
    pub location: Option<serde_json::Value>,
}

impl NewMessage {
    /// A text message request.
    pub fn text(data: impl Into<String>) -> Self {
        Self {
            kind: MessageType::Text.as_str().into(),
            data: data.into(),
            ..Default::default()
        }
    }

    /// A request of an arbitrary (possibly invalid) type.
    pub fn of_kind(kind: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: data.into(),
            ..Default::default()
        }
    }

    pub fn with_client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_date_time(mut self, date_time: DateTimeInput) -> Self {
        self.date_time = Some(date_time);
        self
    }

    pub fn with_attachment(mut self, attachment: RawAttachment) -> Self {
        self.attachments.get_or_insert_with(Vec::new).push(attachment);
        self
    }

    pub fn with_location(mut self, location: serde_json::Value) -> Self {
        self.location = Some(location);
        self
    }

    /// Submitted attachments; an absent list counts as empty.
    pub fn attachments(&self) -> &[RawAttachment] {
        self.attachments.as_deref().unwrap_or_default()
    }

    /// Parse the submitted type.
    pub fn message_type(&self) -> Result<MessageType, TypeError> {
        self.kind.parse()
    }

    /// Resolve the submitted date-time, defaulting to now.
    pub fn timestamp(&self) -> Result<MessageTimestamp, TypeError> {
        match &self.date_time {
            Some(input) => input.resolve(),
            None => Ok(MessageTimestamp::now()),
        }
    }
}
