use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncRead;

use crate::utils::media::is_safe_filename;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("'{filename}' not found in {root}")]
    NotFound { root: String, filename: String },

    #[error("invalid filename '{0}'")]
    InvalidFilename(String),

    #[error("{op} '{filename}' in {root} failed: {source}")]
    Io {
        op: &'static str,
        root: String,
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("dual write of '{filename}' failed: {}", describe_failures(.failures))]
    DualWrite {
        filename: String,
        failures: Vec<StorageError>,
    },
}

fn describe_failures(failures: &[StorageError]) -> String {
    failures
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub struct ObjectMetadata {
    pub filename: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

pub struct ObjectReader {
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    pub size: u64,
}

/// A flat namespace of stored assets.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Label used in logs and errors
    fn name(&self) -> &str;
    async fn upload_file(&self, filename: &str, data: &[u8]) -> Result<(), StorageError>;
    async fn open_file(&self, filename: &str) -> Result<ObjectReader, StorageError>;
    /// `Ok(false)` when there was nothing to delete
    async fn delete_file(&self, filename: &str) -> Result<bool, StorageError>;
    async fn list_objects(&self) -> Result<Vec<ObjectMetadata>, StorageError>;
    async fn health_check(&self) -> bool;
}

/// Storage rooted at a local directory.
pub struct LocalStorageService {
    label: String,
    root: PathBuf,
}

impl LocalStorageService {
    pub fn new(label: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory (and parents) if absent
    pub async fn ensure_root(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| self.io_error("create", "", e))
    }

    fn resolve(&self, filename: &str) -> Result<PathBuf, StorageError> {
        if !is_safe_filename(filename) {
            return Err(StorageError::InvalidFilename(filename.to_string()));
        }
        Ok(self.root.join(filename))
    }

    fn io_error(&self, op: &'static str, filename: &str, source: std::io::Error) -> StorageError {
        if source.kind() == std::io::ErrorKind::NotFound && op != "create" && op != "write" {
            return StorageError::NotFound {
                root: self.label.clone(),
                filename: filename.to_string(),
            };
        }
        StorageError::Io {
            op,
            root: format!("{} ({})", self.label, self.root.display()),
            filename: filename.to_string(),
            source,
        }
    }
}

fn to_utc(time: std::io::Result<std::time::SystemTime>) -> Option<DateTime<Utc>> {
    time.ok().map(DateTime::<Utc>::from)
}

#[async_trait]
impl StorageService for LocalStorageService {
    fn name(&self) -> &str {
        &self.label
    }

    async fn upload_file(&self, filename: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(filename)?;
        self.ensure_root().await?;
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| self.io_error("write", filename, e))
    }

    async fn open_file(&self, filename: &str) -> Result<ObjectReader, StorageError> {
        let path = self.resolve(filename)?;
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| self.io_error("open", filename, e))?;
        let meta = file
            .metadata()
            .await
            .map_err(|e| self.io_error("stat", filename, e))?;
        if !meta.is_file() {
            return Err(StorageError::NotFound {
                root: self.label.clone(),
                filename: filename.to_string(),
            });
        }
        Ok(ObjectReader {
            reader: Box::new(file),
            size: meta.len(),
        })
    }

    async fn delete_file(&self, filename: &str) -> Result<bool, StorageError> {
        let path = self.resolve(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.io_error("delete", filename, e)),
        }
    }

    async fn list_objects(&self) -> Result<Vec<ObjectMetadata>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error("list", "", e)),
        };

        let mut objects = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| self.io_error("list", "", e))?
        {
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };
            // Entries can vanish between readdir and stat
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let modified_at = to_utc(meta.modified()).unwrap_or_else(Utc::now);
            let created_at = to_utc(meta.created()).unwrap_or(modified_at);
            objects.push(ObjectMetadata {
                filename,
                size: meta.len(),
                created_at,
                modified_at,
            });
        }

        Ok(objects)
    }

    async fn health_check(&self) -> bool {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) => meta.is_dir() && !meta.permissions().readonly(),
            Err(_) => false,
        }
    }
}

/// Writes identical bytes to the serving root and the build-assets root.
///
/// Both writes are always attempted. A failure in one root does not roll back
/// the other, so a failed call can leave the asset in at most one root.
#[derive(Clone)]
pub struct DualWriter {
    serving: Arc<dyn StorageService>,
    build_assets: Arc<dyn StorageService>,
}

impl DualWriter {
    pub fn new(serving: Arc<dyn StorageService>, build_assets: Arc<dyn StorageService>) -> Self {
        Self {
            serving,
            build_assets,
        }
    }

    pub async fn write(&self, filename: &str, data: &[u8]) -> Result<(), StorageError> {
        let (serving, build_assets) = tokio::join!(
            self.serving.upload_file(filename, data),
            self.build_assets.upload_file(filename, data),
        );

        let mut failures = Vec::new();
        for (root, result) in [
            (self.serving.name(), serving),
            (self.build_assets.name(), build_assets),
        ] {
            if let Err(e) = result {
                tracing::error!(
                    filename = %filename,
                    root = %root,
                    "❌ Failed to write asset: {}",
                    e
                );
                failures.push(e);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(StorageError::DualWrite {
                filename: filename.to_string(),
                failures,
            })
        }
    }

    /// Removes the file from both roots. Returns how many roots actually held it.
    /// A root whose removal fails is logged and counted as not holding the file.
    pub async fn delete(&self, filename: &str) -> usize {
        let (serving, build_assets) = tokio::join!(
            self.serving.delete_file(filename),
            self.build_assets.delete_file(filename),
        );

        let mut removed = 0;
        for (root, result) in [
            (self.serving.name(), serving),
            (self.build_assets.name(), build_assets),
        ] {
            match result {
                Ok(true) => removed += 1,
                Ok(false) => tracing::debug!("{} not present in {}", filename, root),
                Err(e) => {
                    tracing::warn!(filename = %filename, root = %root, "Failed to delete asset: {}", e);
                }
            }
        }

        removed
    }
}
