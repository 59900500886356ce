use std::sync::Arc;

use msglog_fabric::Broadcaster;
use msglog_store::{AttachmentStore, MessageStore};
use msglog_types::{Message, NewMessage};
use tracing::{error, info};

use crate::error::IngestResult;
use crate::sequencer::PublishSequencer;
use crate::validate::{validate, ValidatedMessage};

/// The only path by which messages enter the log.
///
/// Holds shared handles to the message log, the attachment store and the
/// broadcaster; clone the `Arc`s to hand the same stores to readers.
/// Concurrent creations are pushed to subscribers in ID order.
pub struct IngestPipeline {
    store: Arc<MessageStore>,
    attachments: Arc<AttachmentStore>,
    broadcaster: Arc<Broadcaster>,
    sequencer: PublishSequencer,
}

impl IngestPipeline {
    pub fn new(
        store: Arc<MessageStore>,
        attachments: Arc<AttachmentStore>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            store,
            attachments,
            broadcaster,
            sequencer: PublishSequencer::new(),
        }
    }

    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    pub fn attachments(&self) -> &Arc<AttachmentStore> {
        &self.attachments
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    /// Validate, append, store attachments, and push one new message.
    ///
    /// Blocks on filesystem I/O; call it from a blocking context. The push
    /// may be delivered by a later call if an earlier ID is still storing its
    /// attachments.
    pub fn create_message(&self, request: NewMessage) -> IngestResult<Arc<Message>> {
        let validated = validate(&request)?;

        let mut allocated = None;
        let appended = self.store.append_with(|id| {
            self.sequencer.reserve(id);
            allocated = Some(id);
            validated.to_message(id)
        });
        let message = match appended {
            Ok(message) => message,
            Err(e) => {
                error!(error = %e, "message append failed");
                if let Some(id) = allocated {
                    self.sequencer.release(id, None, &self.broadcaster);
                }
                return Err(e.into());
            }
        };

        if let Err(e) = self.write_attachments(&validated, &message) {
            self.sequencer.release(message.id, None, &self.broadcaster);
            return Err(e);
        }

        info!(
            id = %message.id,
            kind = %message.kind,
            attachments = message.attachment_names.len(),
            "message created"
        );
        self.sequencer
            .release(message.id, Some(Arc::clone(&message)), &self.broadcaster);
        Ok(message)
    }

    fn write_attachments(&self, validated: &ValidatedMessage, message: &Message) -> IngestResult<()> {
        for attachment in &validated.attachments {
            self.attachments
                .save_decoded(message.id, &attachment.name, &attachment.bytes)
                .inspect_err(|e| {
                    error!(
                        id = %message.id,
                        name = %attachment.name,
                        error = %e,
                        "attachment write failed after message was stored"
                    )
                })?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for IngestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestPipeline")
            .field("store", &self.store)
            .field("attachments", &self.attachments.root())
            .field("broadcaster", &self.broadcaster)
            .field("sequencer", &self.sequencer)
            .finish()
    }
}
