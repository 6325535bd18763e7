use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pvm_core::{PhpVersion, PvmError};

pub const ROOT_ENV: &str = "PVM_ROOT";
pub const LINK_PATH_ENV: &str = "PHP_PATH";

#[cfg(windows)]
pub const INTERPRETER_FILE_NAME: &str = "php.exe";
#[cfg(not(windows))]
pub const INTERPRETER_FILE_NAME: &str = "php";

/// Installation root plus the active link, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PvmLayout {
    root: PathBuf,
    link_path: PathBuf,
}

impl PvmLayout {
    pub fn new(root: impl Into<PathBuf>, link_path: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            link_path: link_path.into(),
        }
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, PvmError>
    where
        F: Fn(&'static str) -> Option<PathBuf>,
    {
        let read = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.as_os_str().is_empty())
                .ok_or(PvmError::MissingEnv { name })
        };
        Ok(Self::new(read(ROOT_ENV)?, read(LINK_PATH_ENV)?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn link_path(&self) -> &Path {
        &self.link_path
    }

    pub fn version_dir(&self, version: &PhpVersion) -> PathBuf {
        self.root.join(version.dir_name())
    }

    pub fn interpreter_path(&self, version: &PhpVersion) -> PathBuf {
        self.version_dir(version).join(INTERPRETER_FILE_NAME)
    }

    pub fn active_interpreter_path(&self) -> PathBuf {
        self.link_path.join(INTERPRETER_FILE_NAME)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(".pvm")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.state_dir().join("tmp")
    }

    pub fn download_path(&self, version: &PhpVersion) -> PathBuf {
        self.tmp_dir()
            .join(format!("download_php_{}.zip", version.dir_name()))
    }

    pub fn ensure_base_dirs(&self) -> Result<()> {
        for dir in [self.root.clone(), self.state_dir(), self.tmp_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}
