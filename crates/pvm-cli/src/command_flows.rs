use std::path::Path;

use anyhow::Result;
use pvm_core::{ActiveVersion, PhpVersion, PvmError, ReleaseArtifact, ReleaseCatalog};
use pvm_installer::{
    current_version, install_version, installed_versions, is_installed, switch_active_version_with,
    uninstall_version, ElevationRequest, Privilege, PvmLayout, SwitchOptions, SwitchOutcome,
};

use crate::render::TerminalRenderer;

/// Indentation the list output has always used; `*` marks the active entry.
const LIST_INDENT: &str = "    ";

pub(crate) fn parse_version_argument(
    raw: Option<&str>,
    verb: &'static str,
) -> Result<PhpVersion, PvmError> {
    match raw.map(str::trim) {
        None | Some("") => Err(PvmError::MissingArgument { verb }),
        Some(label) => PhpVersion::parse(label),
    }
}

pub(crate) fn run_install_command<C, D>(
    layout: &PvmLayout,
    raw: Option<&str>,
    renderer: TerminalRenderer,
    resolve_catalog: C,
    download: D,
) -> Result<()>
where
    C: FnOnce() -> Result<ReleaseCatalog>,
    D: FnOnce(&ReleaseArtifact, &Path) -> Result<()>,
{
    let version = parse_version_argument(raw, "install")?;
    let outcome = install_version(layout, &version, resolve_catalog, download)?;
    tracing::debug!(
        url = %outcome.artifact.path,
        files = outcome.extracted_files,
        dir = %outcome.install_dir.display(),
        "installed release"
    );
    renderer.print_status(
        "success",
        &format!("PHP v{} installed successfully.", outcome.version),
    );
    Ok(())
}

pub(crate) fn run_use_command<P, R>(
    layout: &PvmLayout,
    raw: Option<&str>,
    elevated: bool,
    renderer: TerminalRenderer,
    probe: P,
    relaunch: R,
) -> Result<()>
where
    P: FnOnce(&PvmLayout) -> Privilege,
    R: FnOnce(&ElevationRequest) -> Result<()>,
{
    let version = parse_version_argument(raw, "use")?;
    if current_version(layout).matches(&version) {
        renderer.print_status("info", &format!("Already using PHP v{version}"));
        return Ok(());
    }
    if !is_installed(layout, &version) {
        return Err(PvmError::NotInstalled {
            version: version.to_string(),
        }
        .into());
    }

    let options = SwitchOptions {
        allow_elevation: !elevated,
    };
    match switch_active_version_with(layout, &version, options, probe, relaunch)? {
        SwitchOutcome::Switched { .. } => {
            renderer.print_status("success", &format!("Switched to PHP v{version}"));
        }
        SwitchOutcome::ElevationRequested => {
            renderer.print_status(
                "info",
                &format!(
                    "Requested administrator rights to switch to PHP v{version}; \
                     the switch finishes in the elevated window."
                ),
            );
        }
    }
    Ok(())
}

pub(crate) fn run_uninstall_command(
    layout: &PvmLayout,
    raw: Option<&str>,
    renderer: TerminalRenderer,
) -> Result<()> {
    let version = parse_version_argument(raw, "uninstall")?;
    if current_version(layout).matches(&version) {
        return Err(PvmError::ActiveVersion {
            version: version.to_string(),
        }
        .into());
    }

    uninstall_version(layout, &version)?;
    renderer.print_status(
        "success",
        &format!("PHP v{version} uninstalled successfully."),
    );
    Ok(())
}

pub(crate) fn run_list_command(layout: &PvmLayout, renderer: TerminalRenderer) -> Result<()> {
    let versions = installed_versions(layout)?;
    if versions.is_empty() {
        return Err(PvmError::NoInstalledVersions.into());
    }

    let active = current_version(layout);
    renderer.print_lines(&format_installed_lines(&versions, &active));
    Ok(())
}

pub(crate) fn run_list_available_command<C>(
    releases_url: &str,
    renderer: TerminalRenderer,
    resolve_catalog: C,
) -> Result<()>
where
    C: FnOnce() -> Result<ReleaseCatalog>,
{
    let catalog = resolve_catalog().map_err(|source| PvmError::CatalogFetch {
        source: source.into(),
    })?;
    if catalog.is_empty() {
        return Err(PvmError::EmptyCatalog {
            url: releases_url.to_string(),
        }
        .into());
    }

    renderer.print_lines(&format_available_lines(&catalog, releases_url));
    Ok(())
}

pub(crate) fn format_installed_lines(versions: &[PhpVersion], active: &ActiveVersion) -> Vec<String> {
    let mut lines = vec!["Installed PHP versions:".to_string()];
    lines.extend(versions.iter().map(|version| {
        let marker = if active.matches(version) { "* " } else { "  " };
        format!("{LIST_INDENT}{marker}{}", version.dir_name())
    }));
    lines
}

pub(crate) fn format_available_lines(catalog: &ReleaseCatalog, releases_url: &str) -> Vec<String> {
    let mut lines = vec!["Available PHP versions:".to_string()];
    for label in catalog.labels() {
        let full_version = catalog
            .release(label)
            .and_then(|release| release.full_version.as_deref());
        lines.push(match full_version {
            Some(full) => format!("{LIST_INDENT}  v{label} ({full})"),
            None => format!("{LIST_INDENT}  v{label}"),
        });
    }
    lines.push(String::new());
    lines.push(format!("This list from {releases_url}"));
    lines
}
