use std::sync::Arc;

use agent_pipeline::AgentOrchestrator;
use common::{
    session::SessionStore,
    storage::store::StorageManager,
    utils::config::{AppConfig, StorageKind},
};
use ingestion_pipeline::IngestionPipeline;

#[derive(Clone)]
pub struct ApiState {
    pub config: AppConfig,
    pub storage: StorageManager,
    pub sessions: SessionStore,
    pub ingestion: Arc<IngestionPipeline>,
    pub orchestrator: Arc<AgentOrchestrator>,
}

impl ApiState {
    pub fn new(
        config: AppConfig,
        storage: StorageManager,
        sessions: SessionStore,
        ingestion: Arc<IngestionPipeline>,
        orchestrator: Arc<AgentOrchestrator>,
    ) -> Self {
        Self {
            config,
            storage,
            sessions,
            ingestion,
            orchestrator,
        }
    }

    /// Public URL of an uploaded blob. S3 blobs get the bucket URL; other
    /// backends expose the storage-relative location.
    pub fn file_url(&self, location: &str) -> String {
        match self.config.storage {
            StorageKind::S3 => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.config.bucket_name, self.config.aws_region, location
            ),
            _ => location.to_string(),
        }
    }
}
