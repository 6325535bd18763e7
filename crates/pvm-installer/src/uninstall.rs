use std::fs;
use std::path::PathBuf;

use anyhow::anyhow;
use pvm_core::{PhpVersion, PvmError};
use tracing::info;

use crate::layout::PvmLayout;

/// Deletes the version directory and everything below it.
///
/// The caller is responsible for refusing to remove the active version.
pub fn uninstall_version(layout: &PvmLayout, version: &PhpVersion) -> Result<PathBuf, PvmError> {
    let dir = layout.version_dir(version);
    let metadata = fs::symlink_metadata(&dir).map_err(|_| PvmError::NotFound {
        version: version.to_string(),
        path: dir.clone(),
    })?;
    if !metadata.is_dir() {
        return Err(PvmError::NotFound {
            version: version.to_string(),
            path: dir,
        });
    }

    fs::remove_dir_all(&dir).map_err(|err| PvmError::Remove {
        version: version.to_string(),
        source: anyhow!(err)
            .context(format!("failed to remove {}", dir.display()))
            .into(),
    })?;
    info!(version = %version, dir = %dir.display(), "uninstalled PHP");
    Ok(dir)
}
