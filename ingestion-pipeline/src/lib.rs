pub mod extractor;
pub mod parser;
pub mod pipeline;
pub mod summarizer;

pub use extractor::{RawToxicClause, ToxicClause, ToxicClauseExtractor};
pub use parser::DocumentParser;
pub use pipeline::{
    DefaultPipelineServices, DocumentSource, IngestionOutput, IngestionPipeline, PipelineServices,
};
pub use summarizer::{Summarizer, Summary, SummaryFields, SUMMARY_FALLBACK};
