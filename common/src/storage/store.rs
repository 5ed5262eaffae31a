use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::{path::Path as ObjPath, ObjectStore};

use crate::utils::config::{AppConfig, StorageKind};

pub type DynStore = Arc<dyn ObjectStore>;

/// Blob storage with persistent state and proper lifecycle management.
///
/// Carries the process-wide upload counter used to name uploaded contract
/// blobs; the counter is monotonic and shared across clones.
#[derive(Clone)]
pub struct StorageManager {
    store: DynStore,
    backend_kind: StorageKind,
    local_base: Option<PathBuf>,
    upload_counter: Arc<AtomicU64>,
}

impl StorageManager {
    pub async fn new(cfg: &AppConfig) -> object_store::Result<Self> {
        let backend_kind = cfg.storage.clone();
        let (store, local_base) = create_storage_backend(cfg).await?;

        Ok(Self {
            store,
            backend_kind,
            local_base,
            upload_counter: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Create a StorageManager with a custom storage backend, useful for
    /// injecting a specific backend in tests.
    pub fn with_backend(store: DynStore, backend_kind: StorageKind) -> Self {
        Self {
            store,
            backend_kind,
            local_base: None,
            upload_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn backend_kind(&self) -> &StorageKind {
        &self.backend_kind
    }

    pub fn local_base_path(&self) -> Option<&std::path::Path> {
        self.local_base.as_deref()
    }

    /// Next value of the monotonic upload counter. Wrap-around is not a
    /// concern within a process lifetime.
    pub fn next_upload_id(&self) -> u64 {
        self.upload_counter.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn put(&self, location: &str, data: Bytes) -> object_store::Result<()> {
        let path = ObjPath::from(location);
        let payload = object_store::PutPayload::from_bytes(data);
        self.store.put(&path, payload).await.map(|_| ())
    }

    pub async fn get(&self, location: &str) -> object_store::Result<Bytes> {
        let path = ObjPath::from(location);
        let result = self.store.get(&path).await?;
        result.bytes().await
    }

    pub async fn exists(&self, location: &str) -> object_store::Result<bool> {
        let path = ObjPath::from(location);
        self.store
            .head(&path)
            .await
            .map(|_| true)
            .or_else(|e| match e {
                object_store::Error::NotFound { .. } => Ok(false),
                _ => Err(e),
            })
    }
}

/// Create a storage backend based on configuration.
async fn create_storage_backend(
    cfg: &AppConfig,
) -> object_store::Result<(DynStore, Option<PathBuf>)> {
    match cfg.storage {
        StorageKind::Local => {
            let base = resolve_base_dir(cfg);
            if !base.exists() {
                tokio::fs::create_dir_all(&base).await.map_err(|e| {
                    object_store::Error::Generic {
                        store: "LocalFileSystem",
                        source: e.into(),
                    }
                })?;
            }
            let store = LocalFileSystem::new_with_prefix(base.clone())?;
            Ok((Arc::new(store), Some(base)))
        }
        StorageKind::Memory => {
            let store = InMemory::new();
            Ok((Arc::new(store), None))
        }
        StorageKind::S3 => {
            let store = AmazonS3Builder::new()
                .with_bucket_name(&cfg.bucket_name)
                .with_access_key_id(&cfg.aws_access_key_id)
                .with_secret_access_key(&cfg.aws_secret_access_key)
                .with_region(&cfg.aws_region)
                .build()?;
            Ok((Arc::new(store), None))
        }
    }
}

/// Resolve the absolute base directory used for local storage from config.
///
/// If `data_dir` is relative, it is resolved against the current working directory.
pub fn resolve_base_dir(cfg: &AppConfig) -> PathBuf {
    if cfg.data_dir.starts_with('/') {
        PathBuf::from(&cfg.data_dir)
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(&cfg.data_dir)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    use super::*;

    /// A ready-to-use configuration for tests that do not touch the
    /// filesystem.
    pub fn test_config_memory() -> AppConfig {
        AppConfig {
            openai_api_key: "test".into(),
            upstage_api_key: "test".into(),
            storage: StorageKind::Memory,
            ..AppConfig::default()
        }
    }

    pub async fn memory_storage() -> StorageManager {
        StorageManager::new(&test_config_memory())
            .await
            .expect("memory storage backend")
    }
}
