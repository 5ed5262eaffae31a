use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use case_retrieval::CaseRetriever;
use common::utils::{config::get_config, llm::LlmClient};

/// Recomputes the embedding archive for the precedent corpus, so the server
/// can take the fast load path on its next start.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = get_config()?;
    let llm = LlmClient::new(&config);

    let retriever = CaseRetriever::new(
        llm,
        PathBuf::from(&config.case_db_path),
        PathBuf::from(&config.embedding_archive_path),
    );

    let rows = retriever.rebuild_archive().await?;
    info!(
        rows,
        archive = %config.embedding_archive_path,
        "embedding archive rebuilt"
    );

    Ok(())
}
