mod context;
mod services;
mod stages;
mod state;

pub use context::{CandidateCase, SelectedCase, SimulationContext};
pub use services::{DefaultSimulatorServices, SimulatorServices};

use std::sync::Arc;

use tracing::info;

use common::error::AppError;
use ingestion_pipeline::{DocumentSource, RawToxicClause};

use self::{
    stages::{
        extract_clauses, parse_document, retrieve_cases, run_simulations, select_best_cases,
        select_relevant_clauses,
    },
    state::ready,
};

/// Result of a dispute simulation run.
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub simulations: Vec<String>,
    pub relevant_toxic_clauses: Vec<RawToxicClause>,
    pub selected_cases: Vec<SelectedCase>,
}

/// Multi-stage dispute simulation over a contract and a user query:
/// parse → extract → select clauses → retrieve → select cases → simulate.
pub struct DisputeSimulator {
    services: Arc<dyn SimulatorServices>,
}

impl DisputeSimulator {
    pub fn with_services(services: Arc<dyn SimulatorServices>) -> Self {
        Self { services }
    }

    #[tracing::instrument(skip_all, fields(query = %query))]
    pub async fn run(
        &self,
        query: &str,
        document: DocumentSource,
    ) -> Result<SimulationOutcome, AppError> {
        self.drive(query, Some(document), None).await
    }

    /// Runs the machine over text that was already parsed; the parse stage
    /// is skipped.
    pub async fn run_with_text(
        &self,
        query: &str,
        document_text: String,
    ) -> Result<SimulationOutcome, AppError> {
        self.drive(query, None, Some(document_text)).await
    }

    async fn drive(
        &self,
        query: &str,
        document: Option<DocumentSource>,
        document_text: Option<String>,
    ) -> Result<SimulationOutcome, AppError> {
        let mut ctx = SimulationContext::new(self.services.as_ref(), query.to_string());
        // Empty preparsed text counts as absent, so the parse stage runs.
        ctx.document_text = document_text.filter(|text| !text.is_empty());

        let machine = ready();

        let machine = parse_document(machine, &mut ctx, document)
            .await
            .map_err(|err| ctx.abort(err))?;
        let machine = extract_clauses(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let machine = select_relevant_clauses(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let machine = retrieve_cases(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let machine = select_best_cases(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let _machine = run_simulations(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;

        info!(
            query = %ctx.query,
            simulations = ctx.simulations.len(),
            "dispute simulation finished"
        );

        Ok(SimulationOutcome {
            simulations: std::mem::take(&mut ctx.simulations),
            relevant_toxic_clauses: std::mem::take(&mut ctx.relevant_toxic_clauses),
            selected_cases: std::mem::take(&mut ctx.selected_cases),
        })
    }
}

#[cfg(test)]
mod tests;
