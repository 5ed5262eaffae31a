use std::sync::Arc;

use async_trait::async_trait;

use case_retrieval::{CaseMatch, CaseRetriever};
use common::{error::AppError, utils::llm::LlmClient};
use ingestion_pipeline::{DocumentParser, DocumentSource, RawToxicClause, ToxicClauseExtractor};

#[async_trait]
pub trait SimulatorServices: Send + Sync {
    async fn parse_document(&self, document: &DocumentSource) -> Result<String, AppError>;

    async fn extract_clauses(&self, document_text: &str)
        -> Result<Vec<RawToxicClause>, AppError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError>;

    async fn top_cases(&self, query: &[f32], k: usize) -> Result<Vec<CaseMatch>, AppError>;

    async fn format_case(&self, case_text: &str) -> String;

    async fn simulate(&self, clause_block: &str, case_summary: &str) -> Result<String, AppError>;
}

pub struct DefaultSimulatorServices {
    parser: DocumentParser,
    extractor: Arc<ToxicClauseExtractor>,
    retriever: Arc<CaseRetriever>,
    llm: LlmClient,
    simulation_prompt: String,
}

impl DefaultSimulatorServices {
    pub fn new(
        parser: DocumentParser,
        extractor: Arc<ToxicClauseExtractor>,
        retriever: Arc<CaseRetriever>,
        llm: LlmClient,
        simulation_prompt: String,
    ) -> Self {
        Self {
            parser,
            extractor,
            retriever,
            llm,
            simulation_prompt,
        }
    }
}

#[async_trait]
impl SimulatorServices for DefaultSimulatorServices {
    async fn parse_document(&self, document: &DocumentSource) -> Result<String, AppError> {
        self.parser
            .parse(document.bytes.clone(), &document.filename)
            .await
    }

    async fn extract_clauses(
        &self,
        document_text: &str,
    ) -> Result<Vec<RawToxicClause>, AppError> {
        // Raw extraction only: this path never attaches precedents and
        // shares no state with the ingestion-side annotation.
        self.extractor.extract(document_text).await
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        self.retriever.embed(text).await
    }

    async fn top_cases(&self, query: &[f32], k: usize) -> Result<Vec<CaseMatch>, AppError> {
        self.retriever.top_cases(query, k).await
    }

    async fn format_case(&self, case_text: &str) -> String {
        self.extractor.format_case(case_text).await
    }

    async fn simulate(&self, clause_block: &str, case_summary: &str) -> Result<String, AppError> {
        let context = format!(
            "1. 독소조항:\n{clause_block}\n\n2. 관련 판례:\n{case_summary}"
        );
        self.llm
            .complete(&self.simulation_prompt, &context, 1.0)
            .await
    }
}
