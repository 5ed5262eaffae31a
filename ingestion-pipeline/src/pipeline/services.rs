use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use common::error::AppError;

use crate::{
    extractor::{ToxicClause, ToxicClauseExtractor},
    parser::DocumentParser,
    summarizer::{Summarizer, Summary},
};

/// An uploaded contract document: opaque bytes plus the original filename.
/// Lives for one request.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    pub bytes: Bytes,
    pub filename: String,
}

#[async_trait]
pub trait PipelineServices: Send + Sync {
    async fn parse_document(&self, document: &DocumentSource) -> Result<String, AppError>;

    async fn summarize(&self, document_text: &str) -> Result<Summary, AppError>;

    async fn extract_highlights(&self, document_text: &str)
        -> Result<Vec<ToxicClause>, AppError>;
}

pub struct DefaultPipelineServices {
    parser: DocumentParser,
    summarizer: Summarizer,
    extractor: Arc<ToxicClauseExtractor>,
}

impl DefaultPipelineServices {
    pub fn new(
        parser: DocumentParser,
        summarizer: Summarizer,
        extractor: Arc<ToxicClauseExtractor>,
    ) -> Self {
        Self {
            parser,
            summarizer,
            extractor,
        }
    }
}

#[async_trait]
impl PipelineServices for DefaultPipelineServices {
    async fn parse_document(&self, document: &DocumentSource) -> Result<String, AppError> {
        self.parser
            .parse(document.bytes.clone(), &document.filename)
            .await
    }

    async fn summarize(&self, document_text: &str) -> Result<Summary, AppError> {
        Ok(self.summarizer.summarize(document_text).await)
    }

    async fn extract_highlights(
        &self,
        document_text: &str,
    ) -> Result<Vec<ToxicClause>, AppError> {
        self.extractor.find(document_text).await
    }
}
