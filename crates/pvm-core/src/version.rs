use std::cmp::Ordering;
use std::fmt;

use crate::error::PvmError;

/// A `<major>.<minor>` PHP release line such as `8.3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhpVersion {
    label: String,
    major: u32,
    minor: u32,
}

impl PhpVersion {
    pub fn parse(input: &str) -> Result<Self, PvmError> {
        let invalid = || PvmError::InvalidVersion {
            input: input.to_string(),
        };
        let (major, minor) = split_major_minor(input).ok_or_else(invalid)?;
        Ok(Self {
            label: input.to_string(),
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }

    /// Parses an installation directory name of the form `v<major>.<minor>`.
    pub fn from_dir_name(name: &str) -> Option<Self> {
        let label = name.strip_prefix('v')?;
        Self::parse(label).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.label
    }

    pub fn dir_name(&self) -> String {
        format!("v{}", self.label)
    }

}

impl fmt::Display for PhpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl PartialOrd for PhpVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PhpVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, &self.label).cmp(&(other.major, other.minor, &other.label))
    }
}

fn split_major_minor(input: &str) -> Option<(&str, &str)> {
    let (major, minor) = input.split_once('.')?;
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if all_digits(major) && all_digits(minor) {
        Some((major, minor))
    } else {
        None
    }
}

/// Result of probing the interpreter behind the active link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveVersion {
    Known(String),
    Unknown,
}

impl ActiveVersion {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(version) => version,
            Self::Unknown => "unknown",
        }
    }

    pub fn matches(&self, version: &PhpVersion) -> bool {
        matches!(self, Self::Known(active) if active == version.as_str())
    }
}

impl fmt::Display for ActiveVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracts `<major>.<minor>` from the first line of `php -v` output.
///
/// The line must contain the token `PHP` followed by a space and a version
/// numeral; patch and build suffixes are ignored.
pub fn parse_reported_version(output: &str) -> ActiveVersion {
    let first_line = output.lines().next().unwrap_or_default();
    let mut rest = first_line;
    while let Some(index) = rest.find("PHP ") {
        let candidate = &rest[index + 4..];
        if let Some(version) = leading_major_minor(candidate) {
            return ActiveVersion::Known(version.to_string());
        }
        rest = candidate;
    }
    ActiveVersion::Unknown
}

fn leading_major_minor(input: &str) -> Option<&str> {
    let major_len = input.bytes().take_while(u8::is_ascii_digit).count();
    if major_len == 0 || input.as_bytes().get(major_len) != Some(&b'.') {
        return None;
    }
    let minor_len = input[major_len + 1..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if minor_len == 0 {
        return None;
    }
    Some(&input[..major_len + 1 + minor_len])
}
