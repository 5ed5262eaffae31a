use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use common::{
    error::AppError,
    utils::{config::AppConfig, llm::LlmClient, prompts::SummaryPromptFile},
};

/// Degraded sentinel emitted when the retry budget is exhausted.
pub const SUMMARY_FALLBACK: &str = "요약에 문제가 있습니다.";

pub const REQUIRED_KEYS: [&str; 7] = [
    "Overall Summary",
    "Purpose",
    "Cost",
    "Revenue",
    "Contract Duration",
    "Contractor's Responsibilities",
    "Key Findings",
];

const SUMMARY_MAX_TOKENS: u32 = 1500;

/// A contract summary: the fixed-schema fields, or the degraded sentinel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Summary {
    Structured(SummaryFields),
    Degraded(String),
}

/// The seven required summary fields, serialized under their external key
/// names in declared order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryFields {
    #[serde(rename = "Overall Summary")]
    pub overall_summary: String,
    #[serde(rename = "Purpose")]
    pub purpose: String,
    #[serde(rename = "Cost")]
    pub cost: String,
    #[serde(rename = "Revenue")]
    pub revenue: String,
    #[serde(rename = "Contract Duration")]
    pub contract_duration: String,
    #[serde(rename = "Contractor's Responsibilities")]
    pub contractor_responsibilities: String,
    #[serde(rename = "Key Findings")]
    pub key_findings: String,
}

impl SummaryFields {
    /// Builds the fields from parsed `key: value` pairs; `None` when any
    /// required key is absent.
    pub fn from_pairs(pairs: &[(String, String)]) -> Option<Self> {
        let lookup = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        Some(Self {
            overall_summary: lookup("Overall Summary")?,
            purpose: lookup("Purpose")?,
            cost: lookup("Cost")?,
            revenue: lookup("Revenue")?,
            contract_duration: lookup("Contract Duration")?,
            contractor_responsibilities: lookup("Contractor's Responsibilities")?,
            key_findings: lookup("Key Findings")?,
        })
    }
}

/// Parses an LLM response line by line into ordered `key: value` pairs.
///
/// A line containing `:` starts a new key (split at the first `:`); lines
/// without `:` continue the current value, joined by newline. The final key
/// is flushed.
pub fn parse_key_values(text: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut current_key: Option<String> = None;
    let mut current_value: Vec<String> = Vec::new();

    for line in text.trim().lines() {
        if let Some((key, value)) = line.split_once(':') {
            if let Some(key) = current_key.take() {
                pairs.push((key, current_value.join("\n").trim().to_string()));
            }
            current_key = Some(key.trim().to_string());
            current_value = vec![value.trim().to_string()];
        } else if current_key.is_some() {
            current_value.push(line.trim().to_string());
        }
    }

    if let Some(key) = current_key {
        pairs.push((key, current_value.join("\n").trim().to_string()));
    }

    pairs
}

/// Renders pairs back into the `key: value` line form the parser accepts.
pub fn render_key_values(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Schema-constrained summary extraction with validation and retry.
pub struct Summarizer {
    llm: LlmClient,
    prompt: SummaryPromptFile,
    max_attempts: usize,
}

impl Summarizer {
    pub fn new(llm: LlmClient, prompt: SummaryPromptFile, max_attempts: usize) -> Self {
        Self {
            llm,
            prompt,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_config(llm: LlmClient, config: &AppConfig) -> Result<Self, AppError> {
        let prompt = common::utils::prompts::load_summary_prompt(&config.summary_prompt_path())?;
        Ok(Self::new(llm, prompt, config.summary_max_attempts))
    }

    /// Extracts the summary, retrying at the stage level until every
    /// required key is present or the budget elapses. Exhaustion degrades to
    /// the sentinel instead of failing the pipeline.
    pub async fn summarize(&self, document_text: &str) -> Summary {
        let user_prompt = self.prompt.joined().replace("{content}", document_text);

        for attempt in 1..=self.max_attempts {
            let response = match self
                .llm
                .complete_with_limits("", &user_prompt, 0.0, Some(SUMMARY_MAX_TOKENS))
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    warn!(attempt, error = %err, "summary completion failed");
                    continue;
                }
            };

            let pairs = parse_key_values(&response);
            match SummaryFields::from_pairs(&pairs) {
                Some(fields) => {
                    debug!(attempt, "summary extracted with all required keys");
                    return Summary::Structured(fields);
                }
                None => {
                    let missing: Vec<&str> = REQUIRED_KEYS
                        .iter()
                        .filter(|key| !pairs.iter().any(|(k, _)| k == *key))
                        .copied()
                        .collect();
                    warn!(attempt, ?missing, "summary response missing required keys");
                }
            }
        }

        Summary::Degraded(SUMMARY_FALLBACK.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn complete_response() -> String {
        [
            "Overall Summary: 용역 계약 전반 요약",
            "Purpose: 소프트웨어 개발 위탁",
            "Cost: 5,000만원",
            "Revenue: 해당 없음",
            "Contract Duration: 2024-01-01 ~ 2024-12-31",
            "Contractor's Responsibilities: 산출물 납품",
            "Key Findings: 위약금 조항 주의",
        ]
        .join("\n")
    }

    #[test]
    fn parses_multiline_values() {
        let text = "Overall Summary: first line\nsecond line\nPurpose: build things";
        let pairs = parse_key_values(text);

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, "Overall Summary");
        assert_eq!(pairs[0].1, "first line\nsecond line");
        assert_eq!(pairs[1].1, "build things");
    }

    #[test]
    fn flushes_the_final_key() {
        let pairs = parse_key_values("Key Findings: last entry");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0], ("Key Findings".to_string(), "last entry".to_string()));
    }

    #[test]
    fn parser_is_idempotent_on_rendered_form() {
        let pairs = parse_key_values(&complete_response());
        let rendered = render_key_values(&pairs);
        let reparsed = parse_key_values(&rendered);

        let as_map = |pairs: &[(String, String)]| -> HashMap<String, String> {
            pairs.iter().cloned().collect()
        };
        assert_eq!(as_map(&pairs), as_map(&reparsed));
    }

    #[test]
    fn fields_require_all_seven_keys() {
        let pairs = parse_key_values(&complete_response());
        assert!(SummaryFields::from_pairs(&pairs).is_some());

        let incomplete = parse_key_values("Overall Summary: only one");
        assert!(SummaryFields::from_pairs(&incomplete).is_none());
    }

    #[test]
    fn summary_serializes_external_key_names_in_order() {
        let pairs = parse_key_values(&complete_response());
        let fields = SummaryFields::from_pairs(&pairs).expect("fields");
        let json = serde_json::to_string(&Summary::Structured(fields)).expect("serialize");

        let mut positions = Vec::new();
        for key in REQUIRED_KEYS {
            let pos = json.find(&format!("\"{key}\"")).expect("key present");
            positions.push(pos);
        }
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn degraded_summary_serializes_as_plain_string() {
        let json =
            serde_json::to_string(&Summary::Degraded(SUMMARY_FALLBACK.to_string())).expect("json");
        assert_eq!(json, format!("\"{SUMMARY_FALLBACK}\""));
    }
}
