use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use case_retrieval::CaseRetriever;
use common::{error::AppError, utils::llm::LlmClient};

const FORMAT_STUB_INVALID: &str = "유효한 판례 정보가 필요합니다.";
const FORMAT_STUB_NON_LEGAL: &str = "계약서 분석과 관련된 내용만 처리할 수 있습니다.";
const FORMAT_STUB_EMPTY: &str = "판례 분석 결과가 없습니다.";

const LEGAL_TERMS: [&str; 4] = ["판례", "법원", "계약", "조항"];

/// A clause as extracted by the LLM, before precedent attachment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawToxicClause {
    pub toxic_clause: String,
    pub reason: String,
}

/// A fully annotated toxic clause. Field order is part of the contract and
/// is preserved on serialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToxicClause {
    pub toxic_clause: String,
    pub reason: String,
    pub related_case_formatted: String,
    pub related_case_raw: String,
    pub similarity: f32,
}

/// Extracts toxic clauses from contract text and attaches the most similar
/// precedent to each.
pub struct ToxicClauseExtractor {
    llm: LlmClient,
    retriever: Arc<CaseRetriever>,
    highlight_prompt: String,
    format_prompt: String,
}

impl ToxicClauseExtractor {
    pub fn new(
        llm: LlmClient,
        retriever: Arc<CaseRetriever>,
        highlight_prompt: String,
        format_prompt: String,
    ) -> Self {
        Self {
            llm,
            retriever,
            highlight_prompt,
            format_prompt,
        }
    }

    /// Raw LLM extraction: a JSON array of `{toxic_clause, reason}` objects.
    /// Malformed output yields an empty list, not an error.
    pub async fn extract(&self, document_text: &str) -> Result<Vec<RawToxicClause>, AppError> {
        let response = self
            .llm
            .complete(&self.highlight_prompt, document_text, 1.0)
            .await?;

        let clauses = parse_clause_array(&response);
        debug!(count = clauses.len(), "toxic clauses extracted");
        Ok(clauses)
    }

    /// Attaches the closest precedent to each clause and formats it. A
    /// per-item failure degrades only that item's formatted field.
    pub async fn annotate(
        &self,
        raw_clauses: Vec<RawToxicClause>,
    ) -> Result<Vec<ToxicClause>, AppError> {
        let mut annotated = Vec::with_capacity(raw_clauses.len());

        for raw in raw_clauses {
            let clause = match self.retriever.most_similar(&raw.toxic_clause).await {
                Ok(matched) => {
                    let formatted = self.format_case(&matched.case_text).await;
                    ToxicClause {
                        toxic_clause: raw.toxic_clause,
                        reason: raw.reason,
                        related_case_formatted: formatted,
                        related_case_raw: matched.case_text,
                        similarity: matched.score,
                    }
                }
                Err(err) => {
                    warn!(error = %err, "precedent retrieval failed for clause");
                    ToxicClause {
                        toxic_clause: raw.toxic_clause,
                        reason: raw.reason,
                        related_case_formatted: format!(
                            "판례 분석 중 오류가 발생했습니다: {err}"
                        ),
                        related_case_raw: String::new(),
                        similarity: 0.0,
                    }
                }
            };
            annotated.push(clause);
        }

        Ok(annotated)
    }

    /// Full extraction with precedent attachment.
    pub async fn find(&self, document_text: &str) -> Result<Vec<ToxicClause>, AppError> {
        let raw = self.extract(document_text).await?;
        self.annotate(raw).await
    }

    /// Renders a precedent body as a human-readable summary. Guardrails
    /// return fixed stubs for inputs that are too short or obviously not
    /// legal material; LLM failures degrade to an error string.
    pub async fn format_case(&self, case_details: &str) -> String {
        let trimmed = case_details.trim();
        if trimmed.chars().count() < 10 {
            return FORMAT_STUB_INVALID.to_string();
        }

        let word_count = trimmed.split_whitespace().count();
        let mentions_legal_term = LEGAL_TERMS.iter().any(|term| trimmed.contains(term));
        if word_count < 5 && !mentions_legal_term {
            return FORMAT_STUB_NON_LEGAL.to_string();
        }

        match self.llm.complete(&self.format_prompt, trimmed, 1.0).await {
            Ok(result) if result.is_empty() => FORMAT_STUB_EMPTY.to_string(),
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "case formatting failed");
                format!("판례 분석 중 오류가 발생했습니다: {err}")
            }
        }
    }
}

/// Locates the JSON array in an LLM response: fences are stripped, then the
/// substring from the first `[` to the last `]` is parsed. Anything that is
/// not an array of clause objects becomes an empty list.
pub fn parse_clause_array(response: &str) -> Vec<RawToxicClause> {
    let stripped = common::utils::llm::strip_code_fences(response);

    let (Some(start), Some(end)) = (stripped.find('['), stripped.rfind(']')) else {
        warn!("no JSON array found in extraction response");
        return Vec::new();
    };
    if end < start {
        return Vec::new();
    }

    let Some(json_str) = stripped.get(start..=end) else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<RawToxicClause>>(json_str) {
        Ok(clauses) => clauses,
        Err(err) => {
            warn!(error = %err, "extraction response was not a clause array");
            Vec::new()
        }
    }
}
