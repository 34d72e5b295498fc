//! Utility functions and helpers.

pub mod http;

use std::path::Path;

/// Remove a working file, logging instead of failing when that is not possible.
pub async fn remove_artifact(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => log::debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not remove {}: {}", path.display(), e),
    }
}
