mod catalog;
mod error;
mod version;

pub use catalog::{
    HostArch, ReleaseArtifact, ReleaseCatalog, ResolvedRelease, DEFAULT_DOWNLOAD_URL,
    DEFAULT_RELEASES_URL, NTS_MARKER,
};
pub use error::{BoxError, FailureKind, PvmError};
pub use version::{parse_reported_version, ActiveVersion, PhpVersion};

#[cfg(test)]
mod tests;
