use std::collections::HashSet;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use msglog_store::{decode_payload, StoreError};
use msglog_types::{
    AttachmentName, Message, MessageId, MessageTimestamp, MessageType, NewMessage,
};

use crate::error::{IngestError, IngestResult};

/// An attachment whose name is validated and whose bytes are decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedAttachment {
    pub name: AttachmentName,
    pub bytes: Vec<u8>,
}

/// A creation request that passed validation and decoding.
///
/// Holds everything needed to build the [`Message`] except its ID.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedMessage {
    pub client_id: Option<String>,
    pub kind: MessageType,
    /// Text as submitted, or canonical base64 of the decoded media bytes.
    pub data: String,
    pub date_time: MessageTimestamp,
    pub attachments: Vec<DecodedAttachment>,
    pub location: Option<serde_json::Value>,
}

impl ValidatedMessage {
    /// Attachment names in submission order.
    pub fn attachment_names(&self) -> Vec<String> {
        self.attachments
            .iter()
            .map(|a| a.name.to_string())
            .collect()
    }

    /// Build the log entry for the allocated `id`.
    pub fn to_message(&self, id: MessageId) -> Message {
        Message {
            client_id: self.client_id.clone(),
            id,
            kind: self.kind,
            data: self.data.clone(),
            date_time: self.date_time,
            attachment_names: self.attachment_names(),
            location: self.location.clone(),
        }
    }
}

/// Validate and decode a creation request without touching any store.
///
/// The type is checked first, so an unknown type is reported even when other
/// fields are also wrong.
pub fn validate(request: &NewMessage) -> IngestResult<ValidatedMessage> {
    let kind = request.message_type()?;
    let date_time = request.timestamp()?;

    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(request.attachments().len());
    for raw in request.attachments() {
        let name = AttachmentName::parse(raw.file.as_str())?;
        if !seen.insert(name.clone()) {
            return Err(IngestError::DuplicateAttachment(name.into_string()));
        }
        names.push(name);
    }

    let attachments = request
        .attachments()
        .iter()
        .zip(names)
        .map(|(raw, name)| {
            let bytes = decode_payload(name.as_str(), &raw.array_buffer)
                .map_err(|e| decode_error(format!("attachment {name}"), e))?;
            Ok(DecodedAttachment { name, bytes })
        })
        .collect::<IngestResult<Vec<_>>>()?;

    let data = if kind.is_media() {
        let bytes = decode_payload(kind.as_str(), &request.data)
            .map_err(|e| decode_error(format!("{kind} data"), e))?;
        BASE64_STANDARD.encode(bytes)
    } else {
        request.data.clone()
    };

    Ok(ValidatedMessage {
        client_id: request.client_id.clone(),
        kind,
        data,
        date_time,
        attachments,
        location: request.location.clone(),
    })
}

fn decode_error(field: String, source: StoreError) -> IngestError {
    let reason = match source {
        StoreError::Decode { reason, .. } => reason,
        other => other.to_string(),
    };
    IngestError::Decode { field, reason }
}
