use tracing::error;

use common::error::AppError;
use ingestion_pipeline::RawToxicClause;

use super::services::SimulatorServices;

/// A precedent candidate retrieved for one clause.
#[derive(Debug, Clone)]
pub struct CandidateCase {
    pub index: usize,
    pub case_text: String,
    pub score: f32,
}

/// The winning precedent for one clause, formatted for the simulation.
#[derive(Debug, Clone)]
pub struct SelectedCase {
    pub case_text: String,
    pub formatted_case: String,
    pub score: f32,
}

/// Scratch state threaded through the simulation stages. Each stage reads
/// and writes named fields; a failing stage aborts the machine, which skips
/// everything downstream.
pub struct SimulationContext<'a> {
    pub services: &'a dyn SimulatorServices,
    pub query: String,
    pub document_text: Option<String>,
    pub toxic_clauses: Vec<RawToxicClause>,
    pub relevant_toxic_clauses: Vec<RawToxicClause>,
    pub similar_cases: Vec<Vec<CandidateCase>>,
    pub selected_cases: Vec<SelectedCase>,
    pub simulations: Vec<String>,
}

impl<'a> SimulationContext<'a> {
    pub fn new(services: &'a dyn SimulatorServices, query: String) -> Self {
        Self {
            services,
            query,
            document_text: None,
            toxic_clauses: Vec::new(),
            relevant_toxic_clauses: Vec::new(),
            similar_cases: Vec::new(),
            selected_cases: Vec::new(),
            simulations: Vec::new(),
        }
    }

    pub fn document_text(&self) -> Result<&str, AppError> {
        self.document_text
            .as_deref()
            .ok_or_else(|| AppError::InternalError("document text expected to be available".into()))
    }

    pub fn abort(&mut self, err: AppError) -> AppError {
        error!(query = %self.query, error = %err, "dispute simulation aborted");
        err
    }
}
