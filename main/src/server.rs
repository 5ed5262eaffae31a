use std::path::PathBuf;
use std::sync::Arc;

use api_router::{api_routes, api_state::ApiState};
use axum::Router;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use agent_pipeline::{
    simulator::DefaultSimulatorServices,
    tools::{FindCaseTool, FindToxicClausesTool, SimulateDisputeTool, WebSearchTool},
    AgentOrchestrator, DisputeSimulator, ToolRegistry,
};
use case_retrieval::CaseRetriever;
use common::{
    session::SessionStore,
    storage::store::StorageManager,
    utils::{
        config::get_config,
        llm::LlmClient,
        prompts::{load_prompt_text, load_summary_prompt},
    },
};
use ingestion_pipeline::{
    DefaultPipelineServices, DocumentParser, IngestionPipeline, Summarizer, ToxicClauseExtractor,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    // Prompt files are required at startup.
    let summary_prompt = load_summary_prompt(&config.summary_prompt_path())?;
    let highlight_prompt = load_prompt_text(&config.highlight_prompt_path())?;
    let format_prompt = load_prompt_text(&config.format_prompt_path())?;
    let simulation_prompt = load_prompt_text(&config.simulation_prompt_path())?;

    let llm = LlmClient::new(&config);

    // Load the precedent corpus up front; a missing corpus is fatal, a
    // missing embedding archive only makes this first load slow.
    let retriever = Arc::new(CaseRetriever::new(
        llm.clone(),
        PathBuf::from(&config.case_db_path),
        PathBuf::from(&config.embedding_archive_path),
    ));
    retriever.load().await?;

    let parser = DocumentParser::new(&config);
    let summarizer = Summarizer::new(llm.clone(), summary_prompt, config.summary_max_attempts);
    let extractor = Arc::new(ToxicClauseExtractor::new(
        llm.clone(),
        Arc::clone(&retriever),
        highlight_prompt,
        format_prompt.clone(),
    ));

    let ingestion = Arc::new(IngestionPipeline::with_services(Arc::new(
        DefaultPipelineServices::new(parser.clone(), summarizer, Arc::clone(&extractor)),
    )));

    let simulator = Arc::new(DisputeSimulator::with_services(Arc::new(
        DefaultSimulatorServices::new(
            parser.clone(),
            Arc::clone(&extractor),
            Arc::clone(&retriever),
            llm.clone(),
            simulation_prompt,
        ),
    )));

    let registry = ToolRegistry::new(vec![
        Arc::new(FindCaseTool::new(
            Arc::clone(&retriever),
            Arc::clone(&extractor),
        )),
        Arc::new(SimulateDisputeTool::new(Arc::clone(&simulator))),
        Arc::new(FindToxicClausesTool::new(
            parser.clone(),
            Arc::clone(&extractor),
        )),
        Arc::new(WebSearchTool::new(&config)),
    ]);
    let orchestrator = Arc::new(AgentOrchestrator::new(llm, registry, format_prompt));

    let storage = StorageManager::new(&config).await?;
    let sessions = SessionStore::new();

    let api_state = ApiState::new(config.clone(), storage, sessions, ingestion, orchestrator);

    let app: Router = api_routes::<ApiState>().with_state(api_state);

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
