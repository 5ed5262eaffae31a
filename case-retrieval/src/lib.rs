mod archive;
mod index;
mod retriever;

pub use archive::EmbeddingArchive;
pub use index::{cosine_similarity, EmbeddingIndex, ScoredRow};
pub use retriever::{Case, CaseMatch, CaseRetriever};
