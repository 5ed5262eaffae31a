mod context;
mod services;
mod stages;
mod state;

pub use services::{DefaultPipelineServices, DocumentSource, PipelineServices};
pub use stages::EMPTY_TEXT_PLACEHOLDER;

use std::{sync::Arc, time::Instant};

use tracing::info;

use common::error::AppError;

use crate::{extractor::ToxicClause, summarizer::Summary};

use self::{
    context::PipelineContext,
    stages::{extract, parse_document, summarize},
    state::ready,
};

/// Result of one ingestion run: the structured summary and the annotated
/// toxic-clause list.
#[derive(Debug, Clone)]
pub struct IngestionOutput {
    pub summary: Summary,
    pub highlights: Vec<ToxicClause>,
}

/// Serial parse → summarize → extract pipeline over an uploaded contract.
pub struct IngestionPipeline {
    services: Arc<dyn PipelineServices>,
}

impl IngestionPipeline {
    pub fn with_services(services: Arc<dyn PipelineServices>) -> Self {
        Self { services }
    }

    #[tracing::instrument(skip_all, fields(document = %document.filename))]
    pub async fn process(&self, document: DocumentSource) -> Result<IngestionOutput, AppError> {
        let mut ctx = PipelineContext::new(self.services.as_ref(), document.filename.clone());

        let machine = ready();
        let pipeline_started = Instant::now();

        let stage_start = Instant::now();
        let machine = parse_document(machine, &mut ctx, document)
            .await
            .map_err(|err| ctx.abort(err))?;
        let parse_ms = stage_start.elapsed().as_millis();

        let stage_start = Instant::now();
        let machine = summarize(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let summarize_ms = stage_start.elapsed().as_millis();

        let stage_start = Instant::now();
        let _machine = extract(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let extract_ms = stage_start.elapsed().as_millis();

        let summary = ctx
            .summary
            .take()
            .ok_or_else(|| AppError::InternalError("summary expected after pipeline run".into()))?;
        let highlights = std::mem::take(&mut ctx.highlights);

        info!(
            document = %ctx.document_name,
            total_ms = pipeline_started.elapsed().as_millis() as u64,
            parse_ms = parse_ms as u64,
            summarize_ms = summarize_ms as u64,
            extract_ms = extract_ms as u64,
            highlight_count = highlights.len(),
            "ingestion pipeline finished"
        );

        Ok(IngestionOutput {
            summary,
            highlights,
        })
    }
}
