use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RELEASES_URL: &str = "https://windows.php.net/downloads/releases/releases.json";
pub const DEFAULT_DOWNLOAD_URL: &str = "https://windows.php.net/downloads/releases/";

/// Build variants start with this marker when they are not thread-safe.
pub const NTS_MARKER: &str = "nts";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostArch {
    X86,
    X64,
}

impl HostArch {
    pub fn current() -> Self {
        Self::from_target_arch(std::env::consts::ARCH)
    }

    pub fn from_target_arch(arch: &str) -> Self {
        match arch {
            "x86" | "i386" | "i586" | "i686" => Self::X86,
            _ => Self::X64,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X64 => "x64",
        }
    }

    pub fn matches_variant(self, variant: &str) -> bool {
        variant.starts_with(NTS_MARKER) && variant.ends_with(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseArtifact {
    pub path: String,
    pub size: String,
    pub sha256: String,
}

/// One installable artifact per release line, already filtered for the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseCatalog {
    releases: BTreeMap<String, ResolvedRelease>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelease {
    pub full_version: Option<String>,
    pub artifact: ReleaseArtifact,
}

#[derive(Debug, Deserialize)]
struct RawRelease {
    #[serde(default)]
    version: Option<String>,
    #[serde(flatten)]
    variants: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawVariant {
    zip: RawZip,
}

#[derive(Debug, Deserialize)]
struct RawZip {
    path: String,
    size: String,
    sha256: String,
}

impl ReleaseCatalog {
    /// Parses the upstream `releases.json` document.
    ///
    /// Only variants accepted by `arch` are decoded; their shape must be
    /// `{ "zip": { "path", "size", "sha256" } }` or the whole parse fails.
    pub fn from_json_str(input: &str, download_base: &str, arch: HostArch) -> Result<Self> {
        let raw: BTreeMap<String, RawRelease> =
            serde_json::from_str(input).context("failed to parse PHP release catalog")?;

        let mut releases = BTreeMap::new();
        for (label, release) in raw {
            for (variant, value) in release.variants {
                if !arch.matches_variant(&variant) {
                    continue;
                }
                let decoded: RawVariant = serde_json::from_value(value).with_context(|| {
                    format!("invalid artifact entry for release '{label}' variant '{variant}'")
                })?;
                releases.insert(
                    label.clone(),
                    ResolvedRelease {
                        full_version: release.version.clone(),
                        artifact: ReleaseArtifact {
                            path: format!("{download_base}{}", decoded.zip.path),
                            size: decoded.zip.size,
                            sha256: decoded.zip.sha256,
                        },
                    },
                );
            }
        }

        Ok(Self { releases })
    }

    pub fn get(&self, version: &str) -> Option<&ReleaseArtifact> {
        self.releases.get(version).map(|release| &release.artifact)
    }

    pub fn release(&self, version: &str) -> Option<&ResolvedRelease> {
        self.releases.get(version)
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// Release labels, newest first by numeric major/minor.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels = self.releases.keys().map(String::as_str).collect::<Vec<_>>();
        labels.sort_by_key(|label| std::cmp::Reverse(numeric_key(label)));
        labels
    }
}

fn numeric_key(label: &str) -> (u64, u64, String) {
    let mut parts = label.split('.');
    let major = parts.next().and_then(|v| v.parse().ok()).unwrap_or(0);
    let minor = parts.next().and_then(|v| v.parse().ok()).unwrap_or(0);
    (major, minor, label.to_string())
}
