use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use common::error::AppError;

/// On-disk form of the embedding index: two named parallel arrays persisted
/// as one JSON document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingArchive {
    pub texts: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
}

impl EmbeddingArchive {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let archive: Self = serde_json::from_str(&raw)?;
        info!(
            path = %path.display(),
            rows = archive.texts.len(),
            "loaded pre-computed embedding archive"
        );
        Ok(archive)
    }

    /// Writes the archive atomically: the JSON is staged in a temp file in
    /// the target directory and renamed over the destination.
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        let parent = path
            .parent()
            .ok_or_else(|| AppError::Validation(format!("{} has no parent", path.display())))?;
        std::fs::create_dir_all(parent)?;

        let staged = tempfile::NamedTempFile::new_in(parent)?;
        serde_json::to_writer(&staged, self)?;
        staged
            .persist(path)
            .map_err(|err| AppError::Io(err.error))?;

        info!(
            path = %path.display(),
            rows = self.texts.len(),
            "saved embedding archive"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_arrays_exactly() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("embeddings.json");

        let archive = EmbeddingArchive {
            texts: vec!["첫번째 판례".into(), "두번째 판례".into()],
            embeddings: vec![vec![0.25, -0.5, 0.125], vec![1.0, 0.0, -1.0]],
        };

        archive.save(&path).expect("save");
        let loaded = EmbeddingArchive::load(&path).expect("load");
        assert_eq!(loaded, archive);

        // Saving the loaded archive again must reproduce the same arrays.
        loaded.save(&path).expect("re-save");
        let reloaded = EmbeddingArchive::load(&path).expect("reload");
        assert_eq!(reloaded, archive);
    }

    #[test]
    fn load_of_missing_archive_fails() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = EmbeddingArchive::load(&dir.path().join("absent.json"));
        assert!(result.is_err());
    }

    #[test]
    fn save_replaces_existing_archive() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("embeddings.json");

        let first = EmbeddingArchive {
            texts: vec!["old".into()],
            embeddings: vec![vec![0.1]],
        };
        first.save(&path).expect("save first");

        let second = EmbeddingArchive {
            texts: vec!["new".into()],
            embeddings: vec![vec![0.9]],
        };
        second.save(&path).expect("save second");

        assert_eq!(EmbeddingArchive::load(&path).expect("load"), second);
    }
}
