use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use pvm_core::{PhpVersion, PvmError};
use tracing::{debug, info};

use crate::config::{DOWNLOAD_URL_ENV, RELEASES_URL_ENV};
use crate::layout::{PvmLayout, LINK_PATH_ENV, ROOT_ENV};

/// Whether this process may rewrite the active link itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    Elevated,
    Restricted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The link now points at `target`.
    Switched { target: PathBuf },
    /// An elevated child was launched to do the switch. Its result is not
    /// observed, so this says nothing about whether the link changed.
    ElevationRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchOptions {
    /// Cleared in the elevated child so it never relaunches itself again.
    pub allow_elevation: bool,
}

impl Default for SwitchOptions {
    fn default() -> Self {
        Self {
            allow_elevation: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElevationRequest {
    pub verb: &'static str,
    pub version: String,
}

impl ElevationRequest {
    pub const ELEVATED_FLAG: &'static str = "--elevated";

    pub fn args(&self) -> Vec<String> {
        vec![
            self.verb.to_string(),
            self.version.clone(),
            Self::ELEVATED_FLAG.to_string(),
        ]
    }
}

/// Repoints the active link at `version`, or hands the job to an elevated
/// copy of this command when the link cannot be modified here.
///
/// Callers have already checked that `version` is installed and not active.
pub fn switch_active_version_with<P, R>(
    layout: &PvmLayout,
    version: &PhpVersion,
    options: SwitchOptions,
    probe: P,
    relaunch: R,
) -> Result<SwitchOutcome, PvmError>
where
    P: FnOnce(&PvmLayout) -> Privilege,
    R: FnOnce(&ElevationRequest) -> Result<()>,
{
    let privilege = probe(layout);
    debug!(?privilege, allow_elevation = options.allow_elevation, "probed link privilege");

    if privilege == Privilege::Restricted && options.allow_elevation {
        let request = ElevationRequest {
            verb: "use",
            version: version.to_string(),
        };
        relaunch(&request).map_err(|source| PvmError::Elevation {
            source: source.into(),
        })?;
        info!(version = %version, "launched elevated switch");
        return Ok(SwitchOutcome::ElevationRequested);
    }

    let target = layout.version_dir(version);
    let link_error = |source: anyhow::Error| PvmError::Link {
        version: version.to_string(),
        link: layout.link_path().to_path_buf(),
        source: source.into(),
    };
    if !target.is_dir() {
        return Err(link_error(anyhow!(
            "installation directory is missing: {}",
            target.display()
        )));
    }

    replace_active_link(layout.link_path(), &target).map_err(link_error)?;
    info!(version = %version, link = %layout.link_path().display(), "switched active link");
    Ok(SwitchOutcome::Switched { target })
}

/// Points `link` at `target`.
///
/// The new link is created beside the old one first, so a failure to create
/// it leaves the current link untouched. On Unix the final rename replaces the
/// old link atomically; Windows cannot rename over a directory link, so the old
/// one is removed just before the rename.
pub fn replace_active_link(link: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = link.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    ensure_replaceable_link(link)?;

    let staged = staged_link_path(link);
    remove_link_if_exists(&staged)?;
    create_dir_link(target, &staged)?;

    #[cfg(windows)]
    if let Err(err) = remove_link_if_exists(link) {
        let _ = remove_link_if_exists(&staged);
        return Err(err);
    }

    if let Err(err) = fs::rename(&staged, link) {
        let _ = remove_link_if_exists(&staged);
        return Err(anyhow!(err).context(format!(
            "failed to move new link into place at {}",
            link.display()
        )));
    }
    Ok(())
}

fn staged_link_path(link: &Path) -> PathBuf {
    let mut name = link
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("php"));
    name.push(".pvm-new");
    link.with_file_name(name)
}

fn ensure_replaceable_link(link: &Path) -> Result<()> {
    match fs::symlink_metadata(link) {
        Ok(metadata) if metadata.file_type().is_symlink() => Ok(()),
        #[cfg(windows)]
        Ok(metadata) if is_junction(&metadata) => Ok(()),
        Ok(_) => Err(anyhow!(
            "refusing to replace {}: it is not a link",
            link.display()
        )),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(anyhow!(err).context(format!("failed to inspect {}", link.display()))),
    }
}

#[cfg(windows)]
fn is_junction(metadata: &fs::Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;

    const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x400;
    metadata.file_attributes() & FILE_ATTRIBUTE_REPARSE_POINT != 0
}

fn remove_link_if_exists(link: &Path) -> Result<()> {
    match fs::symlink_metadata(link) {
        Ok(_) => remove_link(link)
            .with_context(|| format!("failed to remove link {}", link.display())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(anyhow!(err).context(format!("failed to inspect {}", link.display()))),
    }
}

#[cfg(windows)]
fn remove_link(link: &Path) -> io::Result<()> {
    fs::remove_dir(link).or_else(|_| fs::remove_file(link))
}

#[cfg(not(windows))]
fn remove_link(link: &Path) -> io::Result<()> {
    fs::remove_file(link)
}

fn create_dir_link(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    let created = std::os::unix::fs::symlink(target, link);
    #[cfg(windows)]
    let created = std::os::windows::fs::symlink_dir(target, link);

    created.with_context(|| {
        format!(
            "failed to create link {} -> {}",
            link.display(),
            target.display()
        )
    })
}

pub fn probe_privilege(layout: &PvmLayout) -> Privilege {
    if can_modify_link(layout.link_path()) {
        Privilege::Elevated
    } else {
        Privilege::Restricted
    }
}

/// Opening the raw physical drive only succeeds for administrators.
#[cfg(windows)]
fn can_modify_link(_link: &Path) -> bool {
    fs::File::open(r"\\.\PHYSICALDRIVE0").is_ok()
}

/// Number of scratch names tried before the write check gives up.
#[cfg(not(windows))]
const WRITE_CHECK_ATTEMPTS: u32 = 16;

/// Creates and removes a scratch file beside the link. Only a file this
/// call created is ever removed; names already taken are skipped.
#[cfg(not(windows))]
fn can_modify_link(link: &Path) -> bool {
    let Some(dir) = link.ancestors().skip(1).find(|dir| dir.is_dir()) else {
        return false;
    };
    for attempt in 0..WRITE_CHECK_ATTEMPTS {
        let scratch = dir.join(write_check_name(attempt));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&scratch)
        {
            Ok(file) => {
                drop(file);
                let _ = fs::remove_file(&scratch);
                return true;
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(_) => return false,
        }
    }
    debug!(dir = %dir.display(), "every write-check name was taken");
    false
}

#[cfg(not(windows))]
pub(crate) fn write_check_name(attempt: u32) -> String {
    if attempt == 0 {
        format!(".pvm-probe-{}", std::process::id())
    } else {
        format!(".pvm-probe-{}-{attempt}", std::process::id())
    }
}

/// Launches `pvm <args>` with elevated rights and returns without waiting.
pub fn relaunch_elevated(request: &ElevationRequest) -> Result<()> {
    let exe = std::env::current_exe().context("failed to locate the running pvm executable")?;
    let mut command = elevation_command(&exe, &request.args());
    debug!(?command, "spawning elevated command");
    command
        .spawn()
        .with_context(|| format!("failed to launch elevated {}", exe.display()))?;
    Ok(())
}

/// Settings the elevated copy needs to find the same root, link and mirror.
/// `sudo` resets the environment unless told to keep them.
const PRESERVED_ENV: [&str; 4] = [ROOT_ENV, LINK_PATH_ENV, RELEASES_URL_ENV, DOWNLOAD_URL_ENV];

pub(crate) fn elevation_command(exe: &Path, args: &[String]) -> Command {
    if cfg!(windows) {
        let argument_list = args
            .iter()
            .map(|arg| format!("'{}'", escape_ps_single_quote(arg)))
            .collect::<Vec<_>>()
            .join(",");
        let mut command = Command::new("powershell");
        command.arg("-NoProfile").arg("-Command").arg(format!(
            "Start-Process -FilePath '{}' -ArgumentList {} -Verb RunAs",
            escape_ps_single_quote(&exe.to_string_lossy()),
            argument_list
        ));
        command
    } else {
        let mut command = Command::new("sudo");
        command
            .arg(format!("--preserve-env={}", PRESERVED_ENV.join(",")))
            .arg("--")
            .arg(exe)
            .args(args);
        command
    }
}

fn escape_ps_single_quote(value: &str) -> String {
    value.replace('\'', "''")
}
