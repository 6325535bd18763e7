use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use pvm_core::{PhpVersion, PvmError, ReleaseArtifact, ReleaseCatalog};
use pvm_security::verify_sha256_file;
use tracing::{debug, info, warn};

use crate::fs_utils::{current_unix_timestamp, remove_file_if_exists};
use crate::layout::PvmLayout;
use crate::registry::is_installed;

pub const PRODUCTION_INI_NAME: &str = "php.ini-production";
pub const ACTIVE_INI_NAME: &str = "php.ini";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub version: PhpVersion,
    pub install_dir: PathBuf,
    pub artifact: ReleaseArtifact,
    pub extracted_files: usize,
}

/// Installs one release line: resolve, download, verify, extract, configure.
///
/// `resolve_catalog` and `download` are the network seams; `download` must
/// write the artifact to the path it is given. An existing installation or
/// version directory is never modified.
pub fn install_version<C, D>(
    layout: &PvmLayout,
    version: &PhpVersion,
    resolve_catalog: C,
    download: D,
) -> Result<InstallOutcome, PvmError>
where
    C: FnOnce() -> Result<ReleaseCatalog>,
    D: FnOnce(&ReleaseArtifact, &Path) -> Result<()>,
{
    if is_installed(layout, version) {
        return Err(PvmError::AlreadyInstalled {
            version: version.to_string(),
        });
    }

    let catalog = resolve_catalog().map_err(|source| PvmError::CatalogFetch {
        source: source.into(),
    })?;
    let artifact = catalog
        .get(version.as_str())
        .cloned()
        .ok_or_else(|| PvmError::UnknownRelease {
            version: version.to_string(),
        })?;

    let install_dir = layout.version_dir(version);
    ensure_install_dir_free(version, &install_dir)?;

    let archive_path = layout.download_path(version);
    let result = fetch_and_install(layout, version, &artifact, &archive_path, download);
    if let Err(err) = remove_file_if_exists(&archive_path) {
        warn!(path = %archive_path.display(), error = %err, "failed to remove downloaded archive");
    }
    let extracted_files = result?;

    info!(version = %version, dir = %install_dir.display(), "installed PHP");
    Ok(InstallOutcome {
        version: version.clone(),
        install_dir,
        artifact,
        extracted_files,
    })
}

fn fetch_and_install<D>(
    layout: &PvmLayout,
    version: &PhpVersion,
    artifact: &ReleaseArtifact,
    archive_path: &Path,
    download: D,
) -> Result<usize, PvmError>
where
    D: FnOnce(&ReleaseArtifact, &Path) -> Result<()>,
{
    let download_error = |source: anyhow::Error| PvmError::Download {
        version: version.to_string(),
        source: source.into(),
    };

    layout.ensure_base_dirs().map_err(download_error)?;
    debug!(url = %artifact.path, path = %archive_path.display(), "downloading artifact");
    download(artifact, archive_path).map_err(download_error)?;

    if let Some(actual) = verify_sha256_file(archive_path, &artifact.sha256).map_err(download_error)? {
        return Err(PvmError::ChecksumMismatch {
            version: version.to_string(),
            expected: artifact.sha256.clone(),
            actual,
        });
    }

    let install_dir = layout.version_dir(version);
    ensure_install_dir_free(version, &install_dir)?;

    let staging_dir = make_staging_dir(layout).map_err(|source| PvmError::Extract {
        version: version.to_string(),
        source: source.into(),
    })?;
    let staged = stage_installation(version, archive_path, &staging_dir, &install_dir);
    if staged.is_err() {
        let _ = fs::remove_dir_all(&staging_dir);
    }
    staged
}

fn stage_installation(
    version: &PhpVersion,
    archive_path: &Path,
    staging_dir: &Path,
    install_dir: &Path,
) -> Result<usize, PvmError> {
    let extracted_files =
        extract_zip_archive(archive_path, staging_dir).map_err(|source| PvmError::Extract {
            version: version.to_string(),
            source: source.into(),
        })?;

    copy_production_ini(staging_dir).map_err(|source| PvmError::Configure {
        version: version.to_string(),
        source: source.into(),
    })?;

    ensure_install_dir_free(version, install_dir)?;
    fs::rename(staging_dir, install_dir).map_err(|err| PvmError::Extract {
        version: version.to_string(),
        source: anyhow!(err)
            .context(format!(
                "failed to move staged installation into {}",
                install_dir.display()
            ))
            .into(),
    })?;
    Ok(extracted_files)
}

fn ensure_install_dir_free(version: &PhpVersion, install_dir: &Path) -> Result<(), PvmError> {
    if fs::symlink_metadata(install_dir).is_ok() {
        return Err(PvmError::AlreadyExists {
            version: version.to_string(),
            path: install_dir.to_path_buf(),
        });
    }
    Ok(())
}

fn make_staging_dir(layout: &PvmLayout) -> Result<PathBuf> {
    let mut dir = layout.tmp_dir();
    dir.push(format!(
        "install-{}-{}",
        std::process::id(),
        current_unix_timestamp()?
    ));
    if dir.exists() {
        fs::remove_dir_all(&dir)
            .with_context(|| format!("failed to clear stale staging dir: {}", dir.display()))?;
    }
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed creating staging dir: {}", dir.display()))?;
    Ok(dir)
}

/// Extracts every entry of `archive_path` below `dst`, keeping the archive's
/// directory structure and, on Unix, its permission bits.
///
/// Returns the number of files written. Entries escaping `dst` are rejected.
pub fn extract_zip_archive(archive_path: &Path, dst: &Path) -> Result<usize> {
    let file = File::open(archive_path)
        .with_context(|| format!("failed to open archive {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("failed to read zip archive {}", archive_path.display()))?;

    let mut extracted_files = 0;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("failed to read zip entry #{index}"))?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(anyhow!("zip entry has unsafe path: {:?}", entry.name()));
        };
        let out_path = dst.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .with_context(|| format!("failed to create {}", out_path.display()))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut out_file = File::create(&out_path)
            .with_context(|| format!("failed to create {}", out_path.display()))?;
        io::copy(&mut entry, &mut out_file)
            .with_context(|| format!("failed to write {}", out_path.display()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;

            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))
                .with_context(|| format!("failed to set mode on {}", out_path.display()))?;
        }

        extracted_files += 1;
    }

    debug!(files = extracted_files, dst = %dst.display(), "extracted archive");
    Ok(extracted_files)
}

/// Materializes `php.ini` from the shipped production template.
pub fn copy_production_ini(install_dir: &Path) -> Result<()> {
    let template = install_dir.join(PRODUCTION_INI_NAME);
    let active = install_dir.join(ACTIVE_INI_NAME);
    fs::copy(&template, &active).with_context(|| {
        format!(
            "failed to copy {} to {}",
            template.display(),
            active.display()
        )
    })?;
    Ok(())
}
