use state_machines::core::GuardError;
use tracing::{debug, instrument, warn};

use common::error::AppError;

use super::{
    context::PipelineContext,
    services::DocumentSource,
    state::{Extracted, IngestionMachine, Parsed, Ready, Summarized},
};

/// Placeholder substituted when the parser returns no text; downstream
/// stages continue on it.
pub const EMPTY_TEXT_PLACEHOLDER: &str = "파싱된 텍스트가 없습니다.";

#[instrument(level = "trace", skip_all, fields(document = %ctx.document_name))]
pub async fn parse_document(
    machine: IngestionMachine<(), Ready>,
    ctx: &mut PipelineContext<'_>,
    document: DocumentSource,
) -> Result<IngestionMachine<(), Parsed>, AppError> {
    let text = ctx.services.parse_document(&document).await?;

    let text = if text.is_empty() {
        warn!(document = %ctx.document_name, "empty parse result; continuing with placeholder");
        EMPTY_TEXT_PLACEHOLDER.to_string()
    } else {
        text
    };

    debug!(
        document = %ctx.document_name,
        text_chars = text.chars().count(),
        "ingestion input ready"
    );
    ctx.document_text = Some(text);

    machine
        .parse()
        .map_err(|(_, guard)| map_guard_error("parse", &guard))
}

#[instrument(level = "trace", skip_all, fields(document = %ctx.document_name))]
pub async fn summarize(
    machine: IngestionMachine<(), Parsed>,
    ctx: &mut PipelineContext<'_>,
) -> Result<IngestionMachine<(), Summarized>, AppError> {
    let text = ctx.document_text()?;
    let summary = ctx.services.summarize(text).await?;

    ctx.summary = Some(summary);

    machine
        .summarize()
        .map_err(|(_, guard)| map_guard_error("summarize", &guard))
}

#[instrument(level = "trace", skip_all, fields(document = %ctx.document_name))]
pub async fn extract(
    machine: IngestionMachine<(), Summarized>,
    ctx: &mut PipelineContext<'_>,
) -> Result<IngestionMachine<(), Extracted>, AppError> {
    let text = ctx.document_text()?;
    let highlights = ctx.services.extract_highlights(text).await?;

    debug!(
        document = %ctx.document_name,
        highlight_count = highlights.len(),
        "toxic clause extraction completed"
    );
    ctx.highlights = highlights;

    machine
        .extract()
        .map_err(|(_, guard)| map_guard_error("extract", &guard))
}

fn map_guard_error(event: &str, guard: &GuardError) -> AppError {
    AppError::InternalError(format!(
        "invalid ingestion pipeline transition during {event}: {guard:?}"
    ))
}
