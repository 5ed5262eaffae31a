use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use common::{error::AppError, utils::llm::LlmClient};

use crate::{archive::EmbeddingArchive, index::EmbeddingIndex};

/// A corpus entry: `key` is the sentence that was embedded, `value` the
/// verbatim precedent body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub key: String,
    pub value: String,
}

/// A retrieved precedent with its cosine score against the query.
#[derive(Debug, Clone)]
pub struct CaseMatch {
    pub index: usize,
    pub case_text: String,
    pub score: f32,
}

struct LoadedCorpus {
    cases: Vec<Case>,
    index: EmbeddingIndex,
}

/// Loads the precedent corpus and its precomputed vectors from disk and
/// answers similarity queries. The corpus is loaded once; the index is
/// read-only afterwards.
pub struct CaseRetriever {
    llm: LlmClient,
    case_db_path: PathBuf,
    archive_path: PathBuf,
    loaded: OnceCell<LoadedCorpus>,
}

impl CaseRetriever {
    pub fn new(llm: LlmClient, case_db_path: PathBuf, archive_path: PathBuf) -> Self {
        Self {
            llm,
            case_db_path,
            archive_path,
            loaded: OnceCell::new(),
        }
    }

    /// Idempotent load: reads the corpus, then either loads the precomputed
    /// archive or computes every vector and writes the archive atomically.
    /// A missing corpus file is fatal; a missing archive is only slow.
    pub async fn load(&self) -> Result<(), AppError> {
        self.corpus().await.map(|_| ())
    }

    async fn corpus(&self) -> Result<&LoadedCorpus, AppError> {
        self.loaded
            .get_or_try_init(|| self.load_corpus())
            .await
    }

    async fn load_corpus(&self) -> Result<LoadedCorpus, AppError> {
        let cases = self.read_case_db()?;

        let archive = match EmbeddingArchive::load(&self.archive_path) {
            Ok(archive) if archive.texts.len() == cases.len() => archive,
            Ok(archive) => {
                warn!(
                    archive_rows = archive.texts.len(),
                    corpus_rows = cases.len(),
                    "embedding archive disagrees with corpus; rebuilding"
                );
                self.build_archive(&cases).await?
            }
            Err(err) => {
                info!(
                    archive = %self.archive_path.display(),
                    error = %err,
                    "no usable embedding archive; computing embeddings"
                );
                self.build_archive(&cases).await?
            }
        };

        let index = EmbeddingIndex::new(archive.texts, archive.embeddings)?;
        info!(cases = cases.len(), dimension = index.dimension(), "case corpus ready");

        Ok(LoadedCorpus { cases, index })
    }

    fn read_case_db(&self) -> Result<Vec<Case>, AppError> {
        let raw = std::fs::read_to_string(&self.case_db_path).map_err(|err| {
            AppError::NotFound(format!(
                "case database {} could not be read: {err}",
                self.case_db_path.display()
            ))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn build_archive(&self, cases: &[Case]) -> Result<EmbeddingArchive, AppError> {
        let mut texts = Vec::with_capacity(cases.len());
        let mut embeddings = Vec::with_capacity(cases.len());

        for case in cases {
            let vector = self.llm.embed(&case.key).await?;
            texts.push(case.key.clone());
            embeddings.push(vector);
        }

        let archive = EmbeddingArchive { texts, embeddings };
        archive.save(&self.archive_path)?;
        Ok(archive)
    }

    /// Recomputes every vector and overwrites the archive, bypassing any
    /// previously loaded state. Used by the reindex binary.
    pub async fn rebuild_archive(&self) -> Result<usize, AppError> {
        let cases = self.read_case_db()?;
        let archive = self.build_archive(&cases).await?;
        Ok(archive.texts.len())
    }

    /// Embeds `text` and returns the closest precedent body with its score.
    pub async fn most_similar(&self, text: &str) -> Result<CaseMatch, AppError> {
        let corpus = self.corpus().await?;
        let query = self.llm.embed(text).await?;
        let best = corpus.index.most_similar(&query)?;

        resolve_match(corpus, best.index, best.score)
    }

    /// Top-k precedents for an already computed query vector, in descending
    /// score order.
    pub async fn top_cases(&self, query: &[f32], k: usize) -> Result<Vec<CaseMatch>, AppError> {
        let corpus = self.corpus().await?;
        corpus
            .index
            .top_k(query, k)?
            .into_iter()
            .map(|row| resolve_match(corpus, row.index, row.score))
            .collect()
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        self.llm.embed(text).await
    }
}

fn resolve_match(corpus: &LoadedCorpus, index: usize, score: f32) -> Result<CaseMatch, AppError> {
    let case = corpus.cases.get(index).ok_or_else(|| {
        AppError::InternalError(format!("case index {index} out of corpus bounds"))
    })?;

    Ok(CaseMatch {
        index,
        case_text: case.value.clone(),
        score,
    })
}
