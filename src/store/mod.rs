pub mod file;
pub mod memory;
pub mod remote;

use crate::core::config::AppConfig;
use crate::core::repository::Repository;
use anyhow::Result;
use file::FileRepository;
use remote::RemoteRepository;
use std::sync::Arc;
use tracing::debug;

/// Opens the repository selected by the `storage` config section. A remote
/// store wins over a local file when both are configured.
pub fn open_repository(config: &AppConfig) -> Result<Arc<dyn Repository>> {
    if let Some(remote) = &config.storage.remote {
        debug!(project_id = %remote.project_id, "Using remote document store");
        return Ok(Arc::new(RemoteRepository::new(remote)?));
    }

    let path = config.ledger_path()?;
    debug!("Using ledger file {}", path.display());
    Ok(Arc::new(FileRepository::new(path)))
}
