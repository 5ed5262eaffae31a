use tracing::error;

use common::error::AppError;

use crate::{extractor::ToxicClause, summarizer::Summary};

use super::services::PipelineServices;

pub struct PipelineContext<'a> {
    pub services: &'a dyn PipelineServices,
    pub document_name: String,
    pub document_text: Option<String>,
    pub summary: Option<Summary>,
    pub highlights: Vec<ToxicClause>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(services: &'a dyn PipelineServices, document_name: String) -> Self {
        Self {
            services,
            document_name,
            document_text: None,
            summary: None,
            highlights: Vec::new(),
        }
    }

    pub fn document_text(&self) -> Result<&str, AppError> {
        self.document_text
            .as_deref()
            .ok_or_else(|| AppError::InternalError("document text expected to be available".into()))
    }

    pub fn abort(&mut self, err: AppError) -> AppError {
        error!(
            document = %self.document_name,
            error = %err,
            "ingestion pipeline aborted"
        );
        err
    }
}
