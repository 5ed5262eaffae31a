use std::cmp::Ordering;

use state_machines::core::GuardError;
use tracing::{debug, instrument};

use case_retrieval::cosine_similarity;
use common::error::AppError;
use ingestion_pipeline::DocumentSource;

use super::{
    context::{CandidateCase, SelectedCase, SimulationContext},
    state::{
        CasesRetrieved, CasesSelected, ClausesSelected, Extracted, Parsed, Ready,
        Simulated, SimulationMachine,
    },
};

/// How many clauses are simulated per request.
const RELEVANT_CLAUSE_LIMIT: usize = 2;
/// Candidate precedents retrieved per clause.
const CANDIDATE_CASE_LIMIT: usize = 10;
/// Case bodies are re-embedded on their first 1024 characters.
const CASE_EMBED_CHAR_LIMIT: usize = 1024;

#[instrument(level = "trace", skip_all, fields(query = %ctx.query))]
pub async fn parse_document(
    machine: SimulationMachine<(), Ready>,
    ctx: &mut SimulationContext<'_>,
    document: Option<DocumentSource>,
) -> Result<SimulationMachine<(), Parsed>, AppError> {
    if ctx.document_text.is_none() {
        let document = document.ok_or_else(|| {
            AppError::Validation("계약서 파일이 제공되지 않았습니다. 파일을 업로드하세요.".into())
        })?;
        let text = ctx.services.parse_document(&document).await?;
        if text.is_empty() {
            return Err(AppError::Processing(
                "문서에서 텍스트를 추출할 수 없습니다.".into(),
            ));
        }
        ctx.document_text = Some(text);
    } else {
        debug!("document already parsed, skipping parse step");
    }

    machine
        .parse()
        .map_err(|(_, guard)| map_guard_error("parse", &guard))
}

#[instrument(level = "trace", skip_all, fields(query = %ctx.query))]
pub async fn extract_clauses(
    machine: SimulationMachine<(), Parsed>,
    ctx: &mut SimulationContext<'_>,
) -> Result<SimulationMachine<(), Extracted>, AppError> {
    let text = ctx.document_text()?;
    let clauses = ctx.services.extract_clauses(text).await?;

    if clauses.is_empty() {
        return Err(AppError::Processing("독소조항을 찾을 수 없습니다.".into()));
    }

    debug!(clause_count = clauses.len(), "toxic clauses extracted for simulation");
    ctx.toxic_clauses = clauses;

    machine
        .extract()
        .map_err(|(_, guard)| map_guard_error("extract", &guard))
}

#[instrument(level = "trace", skip_all, fields(query = %ctx.query))]
pub async fn select_relevant_clauses(
    machine: SimulationMachine<(), Extracted>,
    ctx: &mut SimulationContext<'_>,
) -> Result<SimulationMachine<(), ClausesSelected>, AppError> {
    let query_embedding = ctx.services.embed(&ctx.query).await?;

    let mut scored = Vec::with_capacity(ctx.toxic_clauses.len());
    for clause in &ctx.toxic_clauses {
        if clause.toxic_clause.is_empty() {
            continue;
        }
        let clause_embedding = ctx.services.embed(&clause.toxic_clause).await?;
        let similarity = cosine_similarity(&clause_embedding, &query_embedding);
        scored.push((clause.clone(), similarity));
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(RELEVANT_CLAUSE_LIMIT);

    if scored.is_empty() {
        return Err(AppError::Processing(
            "질문과 관련된 독소조항을 찾지 못했습니다.".into(),
        ));
    }

    debug!(selected = scored.len(), "relevant toxic clauses selected");
    ctx.relevant_toxic_clauses = scored.into_iter().map(|(clause, _)| clause).collect();

    machine
        .select_clauses()
        .map_err(|(_, guard)| map_guard_error("select_clauses", &guard))
}

#[instrument(level = "trace", skip_all, fields(query = %ctx.query))]
pub async fn retrieve_cases(
    machine: SimulationMachine<(), ClausesSelected>,
    ctx: &mut SimulationContext<'_>,
) -> Result<SimulationMachine<(), CasesRetrieved>, AppError> {
    let mut similar_cases = Vec::with_capacity(ctx.relevant_toxic_clauses.len());

    for clause in &ctx.relevant_toxic_clauses {
        let combined_query = format!("{} {}", ctx.query, clause.toxic_clause);
        let embedding = ctx.services.embed(&combined_query).await?;
        let matches = ctx
            .services
            .top_cases(&embedding, CANDIDATE_CASE_LIMIT)
            .await?;

        similar_cases.push(
            matches
                .into_iter()
                .map(|case| CandidateCase {
                    index: case.index,
                    case_text: case.case_text,
                    score: case.score,
                })
                .collect(),
        );
    }

    debug!(
        clause_count = similar_cases.len(),
        "candidate precedents retrieved"
    );
    ctx.similar_cases = similar_cases;

    machine
        .retrieve()
        .map_err(|(_, guard)| map_guard_error("retrieve", &guard))
}

#[instrument(level = "trace", skip_all, fields(query = %ctx.query))]
pub async fn select_best_cases(
    machine: SimulationMachine<(), CasesRetrieved>,
    ctx: &mut SimulationContext<'_>,
) -> Result<SimulationMachine<(), CasesSelected>, AppError> {
    let query_embedding = ctx.services.embed(&ctx.query).await?;

    let mut selected = Vec::with_capacity(ctx.similar_cases.len());
    for candidates in &ctx.similar_cases {
        let mut best: Option<(&CandidateCase, f32)> = None;

        for candidate in candidates {
            let head: String = candidate.case_text.chars().take(CASE_EMBED_CHAR_LIMIT).collect();
            let case_embedding = ctx.services.embed(&head).await?;
            let similarity = cosine_similarity(&case_embedding, &query_embedding);

            if best.map_or(true, |(_, current)| similarity > current) {
                best = Some((candidate, similarity));
            }
        }

        if let Some((candidate, similarity)) = best {
            let formatted = ctx.services.format_case(&candidate.case_text).await;
            debug!(similarity, "selected and formatted best case");
            selected.push(SelectedCase {
                case_text: candidate.case_text.clone(),
                formatted_case: formatted,
                score: similarity,
            });
        }
    }

    if selected.is_empty() {
        return Err(AppError::Processing("관련 판례를 선택하지 못했습니다.".into()));
    }

    ctx.selected_cases = selected;

    machine
        .select_cases()
        .map_err(|(_, guard)| map_guard_error("select_cases", &guard))
}

#[instrument(level = "trace", skip_all, fields(query = %ctx.query))]
pub async fn run_simulations(
    machine: SimulationMachine<(), CasesSelected>,
    ctx: &mut SimulationContext<'_>,
) -> Result<SimulationMachine<(), Simulated>, AppError> {
    let pairs = ctx
        .relevant_toxic_clauses
        .iter()
        .zip(ctx.selected_cases.iter());

    let mut simulations = Vec::with_capacity(ctx.selected_cases.len());
    for (clause, case) in pairs {
        let clause_block = format!(
            "- 조항: {}\n- 이유: {}",
            clause.toxic_clause, clause.reason
        );
        let transcript = ctx
            .services
            .simulate(&clause_block, &case.formatted_case)
            .await?;
        simulations.push(transcript);
    }

    debug!(count = simulations.len(), "dispute simulations completed");
    ctx.simulations = simulations;

    machine
        .simulate()
        .map_err(|(_, guard)| map_guard_error("simulate", &guard))
}

fn map_guard_error(event: &str, guard: &GuardError) -> AppError {
    AppError::InternalError(format!(
        "invalid simulation pipeline transition during {event}: {guard:?}"
    ))
}
