use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

use case_retrieval::CaseMatch;
use common::error::AppError;
use ingestion_pipeline::{DocumentSource, RawToxicClause};

use super::{DisputeSimulator, SimulatorServices};

fn sample_document() -> DocumentSource {
    DocumentSource {
        bytes: Bytes::from_static(b"%PDF-1.4 simulated"),
        filename: "contract.pdf".into(),
    }
}

fn clause(text: &str, reason: &str) -> RawToxicClause {
    RawToxicClause {
        toxic_clause: text.into(),
        reason: reason.into(),
    }
}

/// Deterministic embeddings: the query and termination-related text point
/// one way, everything else the other, so clause ranking is predictable.
fn mock_embedding(text: &str) -> Vec<f32> {
    if text.contains("해지") {
        vec![1.0, 0.0]
    } else if text.contains("위약금") {
        vec![0.7, 0.7]
    } else {
        vec![0.0, 1.0]
    }
}

struct MockServices {
    clauses: Vec<RawToxicClause>,
    calls: Mutex<Vec<&'static str>>,
}

impl MockServices {
    fn new(clauses: Vec<RawToxicClause>) -> Self {
        Self {
            clauses,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SimulatorServices for MockServices {
    async fn parse_document(&self, _document: &DocumentSource) -> Result<String, AppError> {
        self.calls.lock().await.push("parse");
        Ok("제1조 ... 제10조 해지 조항 ...".into())
    }

    async fn extract_clauses(
        &self,
        _document_text: &str,
    ) -> Result<Vec<RawToxicClause>, AppError> {
        self.calls.lock().await.push("extract");
        Ok(self.clauses.clone())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        Ok(mock_embedding(text))
    }

    async fn top_cases(&self, _query: &[f32], k: usize) -> Result<Vec<CaseMatch>, AppError> {
        self.calls.lock().await.push("retrieve");
        let matches = vec![
            CaseMatch {
                index: 0,
                case_text: "해지 위약금 분쟁 판결 전문".into(),
                score: 0.9,
            },
            CaseMatch {
                index: 1,
                case_text: "관할 합의 분쟁 판결 전문".into(),
                score: 0.5,
            },
        ];
        Ok(matches.into_iter().take(k).collect())
    }

    async fn format_case(&self, case_text: &str) -> String {
        format!("제목: 정리된 판례\n요약: {case_text}")
    }

    async fn simulate(&self, clause_block: &str, _case_summary: &str) -> Result<String, AppError> {
        self.calls.lock().await.push("simulate");
        Ok(format!(
            "상황: {clause_block}에 따른 분쟁 상황\n사용자: \"어떻게 되나요?\"\n상담원: \"조항에 따라 처리됩니다.\""
        ))
    }
}

struct EmptyExtractionServices {
    inner: MockServices,
}

#[async_trait]
impl SimulatorServices for EmptyExtractionServices {
    async fn parse_document(&self, document: &DocumentSource) -> Result<String, AppError> {
        self.inner.parse_document(document).await
    }

    async fn extract_clauses(
        &self,
        _document_text: &str,
    ) -> Result<Vec<RawToxicClause>, AppError> {
        Ok(Vec::new())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        self.inner.embed(text).await
    }

    async fn top_cases(&self, query: &[f32], k: usize) -> Result<Vec<CaseMatch>, AppError> {
        self.inner.top_cases(query, k).await
    }

    async fn format_case(&self, case_text: &str) -> String {
        self.inner.format_case(case_text).await
    }

    async fn simulate(&self, clause_block: &str, case_summary: &str) -> Result<String, AppError> {
        self.inner.simulate(clause_block, case_summary).await
    }
}

#[tokio::test]
async fn selects_top_two_clauses_by_query_similarity() {
    let services = Arc::new(MockServices::new(vec![
        clause("일방적 해지 조항", "사전 통지 없음"),
        clause("관할 법원 제한", "소비자에게 불리한 관할"),
        clause("위약금 3배 조항", "과도한 위약금"),
    ]));
    let simulator = DisputeSimulator::with_services(services.clone());

    let outcome = simulator
        .run("계약 해지 시뮬레이션", sample_document())
        .await
        .expect("outcome");

    // The termination clause aligns with the query; the penalty clause is
    // the runner-up; the venue clause is dropped.
    assert_eq!(outcome.relevant_toxic_clauses.len(), 2);
    assert_eq!(
        outcome.relevant_toxic_clauses[0].toxic_clause,
        "일방적 해지 조항"
    );
    assert_eq!(
        outcome.relevant_toxic_clauses[1].toxic_clause,
        "위약금 3배 조항"
    );

    assert_eq!(outcome.simulations.len(), 2);
    assert_eq!(outcome.selected_cases.len(), 2);
    for case in &outcome.selected_cases {
        assert!(case.formatted_case.starts_with("제목: 정리된 판례"));
    }
}

#[tokio::test]
async fn simulations_parse_into_role_triples() {
    let services = Arc::new(MockServices::new(vec![clause(
        "일방적 해지 조항",
        "사전 통지 없음",
    )]));
    let simulator = DisputeSimulator::with_services(services);

    let outcome = simulator
        .run("해지하면 어떻게 되나요", sample_document())
        .await
        .expect("outcome");

    for transcript in &outcome.simulations {
        let (situation, user, agent) = crate::processors::parse_simulation(transcript);
        assert!(!situation.is_empty());
        assert!(!user.is_empty());
        assert!(!agent.is_empty());
    }
}

#[tokio::test]
async fn preparsed_text_skips_the_parse_stage() {
    let services = Arc::new(MockServices::new(vec![clause("해지 조항", "이유")]));
    let simulator = DisputeSimulator::with_services(services.clone());

    simulator
        .run_with_text("해지 문의", "이미 파싱된 계약서 본문".into())
        .await
        .expect("outcome");

    let calls = services.calls.lock().await.clone();
    assert!(!calls.contains(&"parse"));
    assert_eq!(calls.first(), Some(&"extract"));
}

#[tokio::test]
async fn empty_extraction_short_circuits_downstream_stages() {
    let inner = MockServices::new(Vec::new());
    let services = Arc::new(EmptyExtractionServices { inner });
    let simulator = DisputeSimulator::with_services(services.clone());

    let result = simulator.run("해지 문의", sample_document()).await;
    assert!(matches!(result, Err(AppError::Processing(_))));

    let calls = services.inner.calls.lock().await.clone();
    assert!(!calls.contains(&"retrieve"));
    assert!(!calls.contains(&"simulate"));
}

#[tokio::test]
async fn missing_document_is_a_validation_error() {
    let services = Arc::new(MockServices::new(vec![clause("해지 조항", "이유")]));
    let simulator = DisputeSimulator::with_services(services);

    // No preparsed text and no document: the parse stage must refuse.
    let result = simulator.run_with_text("해지 문의", String::new()).await;
    assert!(result.is_err());
}
