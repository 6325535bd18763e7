use std::path::PathBuf;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Broad failure class, logged by the command boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    UserInput,
    StateConflict,
    Transport,
    Filesystem,
    Configuration,
}

#[derive(Debug, thiserror::Error)]
pub enum PvmError {
    #[error("Please specify the PHP version to {verb}.")]
    MissingArgument { verb: &'static str },

    #[error("Invalid PHP version number: '{input}' (expected <major>.<minor>, e.g. 8.3)")]
    InvalidVersion { input: String },

    #[error("PHP v{version} is not found in the release catalog.")]
    UnknownRelease { version: String },

    #[error("PHP v{version} is already installed.")]
    AlreadyInstalled { version: String },

    #[error("PHP v{version} is not installed.")]
    NotInstalled { version: String },

    #[error("You cannot uninstall the current PHP version (v{version}).")]
    ActiveVersion { version: String },

    #[error("PHP v{version} already exists: {}", .path.display())]
    AlreadyExists { version: String, path: PathBuf },

    #[error("PHP v{version} does not exist: {}", .path.display())]
    NotFound { version: String, path: PathBuf },

    #[error("No installed PHP versions found.")]
    NoInstalledVersions,

    #[error("No available PHP versions found in {url}.")]
    EmptyCatalog { url: String },

    #[error("Failed to get PHP releases.")]
    CatalogFetch {
        #[source]
        source: BoxError,
    },

    #[error("Failed to download PHP v{version}.")]
    Download {
        version: String,
        #[source]
        source: BoxError,
    },

    #[error("sha256 mismatch for PHP v{version} (expected {expected}, got {actual})")]
    ChecksumMismatch {
        version: String,
        expected: String,
        actual: String,
    },

    #[error("Failed to unzip PHP v{version}.")]
    Extract {
        version: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to copy php.ini for PHP v{version}.")]
    Configure {
        version: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to remove PHP v{version}.")]
    Remove {
        version: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to point {} at PHP v{version}.", .link.display())]
    Link {
        version: String,
        link: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("Failed to request administrator rights.")]
    Elevation {
        #[source]
        source: BoxError,
    },

    #[error("{name} is not set; export it before running this command.")]
    MissingEnv { name: &'static str },
}

impl PvmError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MissingArgument { .. }
            | Self::InvalidVersion { .. }
            | Self::UnknownRelease { .. } => FailureKind::UserInput,
            Self::AlreadyInstalled { .. }
            | Self::NotInstalled { .. }
            | Self::ActiveVersion { .. }
            | Self::AlreadyExists { .. }
            | Self::NotFound { .. }
            | Self::NoInstalledVersions
            | Self::EmptyCatalog { .. } => FailureKind::StateConflict,
            Self::CatalogFetch { .. } | Self::Download { .. } | Self::ChecksumMismatch { .. } => {
                FailureKind::Transport
            }
            Self::Extract { .. }
            | Self::Configure { .. }
            | Self::Remove { .. }
            | Self::Link { .. }
            | Self::Elevation { .. } => FailureKind::Filesystem,
            Self::MissingEnv { .. } => FailureKind::Configuration,
        }
    }

    /// Refusals that leave nothing to repair render as warnings; a release
    /// that cannot be found, a malformed label or a missing install are errors.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::MissingArgument { .. }
                | Self::AlreadyInstalled { .. }
                | Self::ActiveVersion { .. }
                | Self::NoInstalledVersions
                | Self::EmptyCatalog { .. }
        )
    }
}
