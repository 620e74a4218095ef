use crate::config::MediaConfig;
use crate::services::storage::{LocalStorageService, StorageError, StorageService};
use std::sync::Arc;
use tracing::info;

pub struct StorageRoots {
    pub serving: Arc<dyn StorageService>,
    pub build_assets: Arc<dyn StorageService>,
}

/// Creates both roots if absent and wraps them as storage services.
pub async fn setup_storage(config: &MediaConfig) -> Result<StorageRoots, StorageError> {
    let serving = LocalStorageService::new("serving", &config.serving_root);
    let build_assets = LocalStorageService::new("build-assets", &config.build_assets_root);

    for root in [&serving, &build_assets] {
        root.ensure_root().await?;
        info!("📁 {} root ready at {}", root.name(), root.root().display());
    }

    Ok(StorageRoots {
        serving: Arc::new(serving),
        build_assets: Arc::new(build_assets),
    })
}
