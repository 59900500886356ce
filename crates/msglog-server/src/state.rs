use std::sync::Arc;

use msglog_fabric::{Broadcaster, BroadcasterConfig};
use msglog_ingest::IngestPipeline;
use msglog_store::{AttachmentStore, MessageStore};

use crate::config::ServerConfig;
use crate::error::ServerResult;

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pipeline: Arc<IngestPipeline>,
    config: Arc<ServerConfig>,
}

impl AppState {
    /// Load the snapshot and prepare the attachment root under `config.data_dir`.
    ///
    /// A corrupt snapshot is an error; a missing one starts an empty log.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        let store = MessageStore::open(config.snapshot_path())?;
        let attachments = AttachmentStore::new(config.attachments_root());
        attachments.ensure_namespace_ready()?;
        let broadcaster = Broadcaster::new(BroadcasterConfig {
            channel_capacity: config.channel_capacity,
        });
        tracing::info!(
            messages = store.len(),
            data_dir = %config.data_dir.display(),
            "message log loaded"
        );
        Ok(Self::from_parts(
            IngestPipeline::new(Arc::new(store), Arc::new(attachments), Arc::new(broadcaster)),
            config,
        ))
    }

    pub fn from_parts(pipeline: IngestPipeline, config: ServerConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
        }
    }

    pub fn pipeline(&self) -> &Arc<IngestPipeline> {
        &self.pipeline
    }

    pub fn store(&self) -> &Arc<MessageStore> {
        self.pipeline.store()
    }

    pub fn attachments(&self) -> &Arc<AttachmentStore> {
        self.pipeline.attachments()
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        self.pipeline.broadcaster()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
