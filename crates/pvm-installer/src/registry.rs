use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Context, Result};
use pvm_core::{parse_reported_version, ActiveVersion, PhpVersion};
use tracing::debug;

use crate::layout::{PvmLayout, INTERPRETER_FILE_NAME};

/// Installed versions as `v<major>.<minor>` labels, oldest first.
pub fn list_installed(layout: &PvmLayout) -> Result<Vec<String>> {
    Ok(installed_versions(layout)?
        .iter()
        .map(PhpVersion::dir_name)
        .collect())
}

/// Scans the installation root; entries that are not valid installations are skipped.
pub fn installed_versions(layout: &PvmLayout) -> Result<Vec<PhpVersion>> {
    let root = layout.root();
    let mut versions = Vec::new();
    for entry in fs::read_dir(root)
        .with_context(|| format!("failed to read installation root: {}", root.display()))?
    {
        let entry = entry
            .with_context(|| format!("failed to read installation root: {}", root.display()))?;
        if !entry.file_type().is_ok_and(|kind| kind.is_dir()) {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(ToOwned::to_owned) else {
            continue;
        };
        let Some(version) = PhpVersion::from_dir_name(&name) else {
            continue;
        };
        if has_interpreter(&entry.path()) {
            versions.push(version);
        } else {
            debug!(dir = %entry.path().display(), "skipping directory without interpreter");
        }
    }

    versions.sort();
    Ok(versions)
}

pub fn is_installed(layout: &PvmLayout, version: &PhpVersion) -> bool {
    installed_versions(layout)
        .map(|versions| versions.contains(version))
        .unwrap_or(false)
}

fn has_interpreter(dir: &Path) -> bool {
    fs::metadata(dir.join(INTERPRETER_FILE_NAME)).is_ok_and(|metadata| metadata.is_file())
}

pub fn current_version(layout: &PvmLayout) -> ActiveVersion {
    current_version_with_runner(layout, |command| command.output())
}

/// Asks the interpreter behind the active link for its version.
///
/// Every failure, from a missing link to unexpected output, maps to
/// [`ActiveVersion::Unknown`].
pub fn current_version_with_runner<F>(layout: &PvmLayout, runner: F) -> ActiveVersion
where
    F: FnOnce(&mut Command) -> io::Result<Output>,
{
    let interpreter = layout.active_interpreter_path();
    let mut command = Command::new(&interpreter);
    command.arg("-v");

    match runner(&mut command) {
        Ok(output) if output.status.success() => {
            parse_reported_version(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            debug!(
                interpreter = %interpreter.display(),
                status = %output.status,
                "active interpreter exited unsuccessfully"
            );
            ActiveVersion::Unknown
        }
        Err(err) => {
            debug!(
                interpreter = %interpreter.display(),
                error = %err,
                "active interpreter could not be started"
            );
            ActiveVersion::Unknown
        }
    }
}
