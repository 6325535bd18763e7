use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use pvm_core::{HostArch, ReleaseCatalog, DEFAULT_DOWNLOAD_URL, DEFAULT_RELEASES_URL};
use reqwest::blocking::Client;
use tracing::debug;

pub const USER_AGENT: &str = concat!("pvm/", env!("CARGO_PKG_VERSION"));

const CATALOG_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the release catalog lives and where its relative paths resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSource {
    releases_url: String,
    download_base: String,
}

impl Default for CatalogSource {
    fn default() -> Self {
        Self::new(DEFAULT_RELEASES_URL, DEFAULT_DOWNLOAD_URL)
    }
}

impl CatalogSource {
    pub fn new(releases_url: impl Into<String>, download_base: impl Into<String>) -> Self {
        let mut download_base = download_base.into();
        if !download_base.ends_with('/') {
            download_base.push('/');
        }
        Self {
            releases_url: releases_url.into(),
            download_base,
        }
    }

    pub fn releases_url(&self) -> &str {
        &self.releases_url
    }

    pub fn download_base(&self) -> &str {
        &self.download_base
    }

    pub fn fetch(&self) -> Result<ReleaseCatalog> {
        self.fetch_for_arch(HostArch::current())
    }

    /// Downloads and resolves the catalog; any failure discards the whole result.
    pub fn fetch_for_arch(&self, arch: HostArch) -> Result<ReleaseCatalog> {
        debug!(url = %self.releases_url, arch = arch.as_str(), "fetching release catalog");
        let client = http_client(Some(CATALOG_TIMEOUT))?;
        let response = client
            .get(&self.releases_url)
            .send()
            .with_context(|| format!("failed to request {}", self.releases_url))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!(
                "release catalog request to {} returned HTTP {status}",
                self.releases_url
            ));
        }
        let body = response
            .text()
            .with_context(|| format!("failed to read body of {}", self.releases_url))?;

        let catalog = ReleaseCatalog::from_json_str(&body, &self.download_base, arch)?;
        debug!(releases = catalog.len(), "resolved release catalog");
        Ok(catalog)
    }
}

/// Blocking client shared by catalog and artifact requests.
///
/// `timeout` of `None` leaves the transfer unbounded, which artifact downloads
/// rely on for slow links.
pub fn http_client(timeout: Option<Duration>) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(15))
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")
}
