use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::warn;

/// Per-client record retaining the last uploaded contract's server path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub pdf_file_path: Option<String>,
    pub original_filename: Option<String>,
}

/// In-memory session store keyed by the client's session id.
///
/// Writes are exclusive per key; replacing an upload removes the prior
/// artifact from disk before the new path is committed.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, session_id: &str) -> Option<Session> {
        self.inner.read().await.get(session_id).cloned()
    }

    pub async fn record_upload(
        &self,
        session_id: &str,
        pdf_file_path: String,
        original_filename: String,
    ) {
        let mut sessions = self.inner.write().await;
        let session = sessions.entry(session_id.to_string()).or_default();

        if let Some(previous) = session.pdf_file_path.take() {
            remove_artifact(&previous).await;
        }

        session.pdf_file_path = Some(pdf_file_path);
        session.original_filename = Some(original_filename);
    }

    pub async fn clear(&self, session_id: &str) {
        let mut sessions = self.inner.write().await;
        if let Some(session) = sessions.remove(session_id) {
            if let Some(path) = session.pdf_file_path {
                remove_artifact(&path).await;
            }
        }
    }
}

async fn remove_artifact(path: &str) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path, error = %err, "failed to remove session artifact");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_replaces_previous_artifact() {
        let dir = tempfile::tempdir().expect("temp dir");
        let first = dir.path().join("first.pdf");
        let second = dir.path().join("second.pdf");
        tokio::fs::write(&first, b"one").await.expect("write first");
        tokio::fs::write(&second, b"two")
            .await
            .expect("write second");

        let store = SessionStore::new();
        store
            .record_upload(
                "client-a",
                first.display().to_string(),
                "contract.pdf".into(),
            )
            .await;
        store
            .record_upload(
                "client-a",
                second.display().to_string(),
                "contract-v2.pdf".into(),
            )
            .await;

        assert!(!first.exists(), "prior artifact should be purged");
        assert!(second.exists());

        let session = store.get("client-a").await.expect("session");
        assert_eq!(
            session.pdf_file_path.as_deref(),
            Some(second.display().to_string().as_str())
        );
        assert_eq!(session.original_filename.as_deref(), Some("contract-v2.pdf"));
    }

    #[tokio::test]
    async fn clear_removes_session_and_artifact() {
        let dir = tempfile::tempdir().expect("temp dir");
        let artifact = dir.path().join("upload.pdf");
        tokio::fs::write(&artifact, b"data").await.expect("write");

        let store = SessionStore::new();
        store
            .record_upload("client-b", artifact.display().to_string(), "a.pdf".into())
            .await;
        store.clear("client-b").await;

        assert!(store.get("client-b").await.is_none());
        assert!(!artifact.exists());
    }

    #[tokio::test]
    async fn sessions_are_isolated_per_client() {
        let store = SessionStore::new();
        store
            .record_upload("client-c", "/tmp/does-not-exist-c.pdf".into(), "c.pdf".into())
            .await;

        assert!(store.get("client-d").await.is_none());
        assert!(store.get("client-c").await.is_some());
    }
}
