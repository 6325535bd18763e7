use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use pvm_core::{ReleaseArtifact, ReleaseCatalog};
use pvm_installer::PvmConfig;
use pvm_registry::{http_client, CatalogSource};
use tracing::debug;

use crate::render::TerminalRenderer;

const DOWNLOAD_BUFFER_SIZE: usize = 64 * 1024;

pub(crate) fn catalog_source(config: &PvmConfig) -> CatalogSource {
    CatalogSource::new(config.releases_url.clone(), config.download_url.clone())
}

pub(crate) fn fetch_catalog(source: &CatalogSource) -> Result<ReleaseCatalog> {
    source
        .fetch()
        .with_context(|| format!("failed to resolve {}", source.releases_url()))
}

/// Downloads `artifact` to `out_path`, driving a progress bar on rich terminals.
pub(crate) fn download_release(
    renderer: TerminalRenderer,
    label: &str,
    artifact: &ReleaseArtifact,
    out_path: &Path,
) -> Result<()> {
    let mut progress = renderer.start_download(label);
    match download_artifact_with_progress(&artifact.path, out_path, |downloaded, total| {
        progress.set(downloaded, total)
    }) {
        Ok(bytes) => {
            progress.finish_success();
            debug!(url = %artifact.path, bytes, expected = %artifact.size, "downloaded artifact");
            Ok(())
        }
        Err(err) => {
            progress.finish_abandon();
            Err(err)
        }
    }
}

/// Streams `url` into `<out_path>.part` and renames it into place once the
/// body is complete. `on_progress` sees `(downloaded, content_length)`.
pub(crate) fn download_artifact_with_progress<F>(
    url: &str,
    out_path: &Path,
    mut on_progress: F,
) -> Result<u64>
where
    F: FnMut(u64, Option<u64>),
{
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create download dir: {}", parent.display()))?;
    }

    let part_path = part_path_for(out_path);
    let downloaded = match stream_to_file(url, &part_path, &mut on_progress) {
        Ok(downloaded) => downloaded,
        Err(err) => {
            let _ = fs::remove_file(&part_path);
            return Err(err);
        }
    };

    if out_path.exists() {
        fs::remove_file(out_path)
            .with_context(|| format!("failed to replace {}", out_path.display()))?;
    }
    fs::rename(&part_path, out_path).with_context(|| {
        format!(
            "failed to move downloaded artifact into place: {}",
            out_path.display()
        )
    })?;

    Ok(downloaded)
}

fn part_path_for(out_path: &Path) -> PathBuf {
    out_path.with_file_name(format!(
        "{}.part",
        out_path
            .file_name()
            .and_then(|v| v.to_str())
            .unwrap_or("artifact")
    ))
}

fn stream_to_file<F>(url: &str, part_path: &Path, on_progress: &mut F) -> Result<u64>
where
    F: FnMut(u64, Option<u64>),
{
    let client = http_client(None)?;
    let mut response = client
        .get(url)
        .send()
        .with_context(|| format!("failed to request {url}"))?;
    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("download request to {url} returned HTTP {status}"));
    }

    let total = response.content_length();
    let mut file = File::create(part_path)
        .with_context(|| format!("failed to create {}", part_path.display()))?;
    let mut buffer = vec![0_u8; DOWNLOAD_BUFFER_SIZE];
    let mut downloaded = 0_u64;
    on_progress(downloaded, total);

    loop {
        let read = response
            .read(&mut buffer)
            .with_context(|| format!("failed reading response body from {url}"))?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read])
            .with_context(|| format!("failed writing {}", part_path.display()))?;
        downloaded += read as u64;
        on_progress(downloaded, total);
    }
    file.flush()
        .with_context(|| format!("failed flushing {}", part_path.display()))?;

    if let Some(expected) = total {
        if downloaded != expected {
            return Err(anyhow!(
                "download from {url} ended after {downloaded} of {expected} bytes"
            ));
        }
    }
    Ok(downloaded)
}
