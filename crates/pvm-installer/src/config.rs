use std::ffi::OsString;
use std::path::PathBuf;

use pvm_core::{PvmError, DEFAULT_DOWNLOAD_URL, DEFAULT_RELEASES_URL};

use crate::layout::PvmLayout;

pub const RELEASES_URL_ENV: &str = "PVM_RELEASES_URL";
pub const DOWNLOAD_URL_ENV: &str = "PVM_DOWNLOAD_URL";

/// Everything pvm reads from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PvmConfig {
    pub layout: PvmLayout,
    pub releases_url: String,
    pub download_url: String,
}

impl PvmConfig {
    pub fn from_env() -> Result<Self, PvmError> {
        Self::from_lookup(std::env::var_os)
    }

    /// Builds the configuration from `lookup`; blank URL overrides fall back
    /// to the upstream defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PvmError>
    where
        F: Fn(&'static str) -> Option<OsString>,
    {
        let layout = PvmLayout::from_lookup(|name| lookup(name).map(PathBuf::from))?;
        let url = |name: &'static str, default: &str| {
            lookup(name)
                .and_then(|value| value.into_string().ok())
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            layout,
            releases_url: url(RELEASES_URL_ENV, DEFAULT_RELEASES_URL),
            download_url: url(DOWNLOAD_URL_ENV, DEFAULT_DOWNLOAD_URL),
        })
    }
}
