//! Release catalog: the latest python-build-standalone release, with a
//! bundled snapshot standing in whenever the API cannot be reached.

use anyhow::{Context, Result};
use kiche_domain::{ReleaseDescriptor, ReleaseDocument};
use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::config::CatalogConfig;

pub const DEFAULT_CATALOG_URL: &str =
    "https://api.github.com/repos/indygreg/python-build-standalone/releases/latest";

const FALLBACK_DOCUMENT: &str = include_str!("fallback.json");

/// Source of downloadable interpreter releases.
pub trait ReleaseCatalog {
    fn fetch(&self) -> Result<Vec<ReleaseDescriptor>>;
}

/// Catalog shipped with the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct BundledCatalog;

impl ReleaseCatalog for BundledCatalog {
    fn fetch(&self) -> Result<Vec<ReleaseDescriptor>> {
        Ok(read_fallback_document()?.descriptors()?)
    }
}

pub fn read_fallback_document() -> Result<ReleaseDocument> {
    debug!("reading bundled release catalog");
    ReleaseDocument::from_slice(FALLBACK_DOCUMENT.as_bytes())
        .context("bundled release catalog is invalid")
}

/// The API catalog, or the bundled one when running offline.
pub fn release_catalog(config: &CatalogConfig, client: Client) -> Box<dyn ReleaseCatalog> {
    if config.offline {
        debug!("offline: using bundled release catalog");
        Box::new(BundledCatalog)
    } else {
        Box::new(HttpCatalog::new(client, config.url.clone()))
    }
}

/// GitHub "latest release" endpoint.
pub struct HttpCatalog {
    client: Client,
    url: String,
}

enum FetchFailure {
    /// Transport error or non-success status; the bundled catalog takes over.
    Unreachable(String),
    Invalid(anyhow::Error),
}

impl HttpCatalog {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    fn fetch_document(&self) -> Result<ReleaseDocument, FetchFailure> {
        debug!(url = %self.url, "querying release catalog");
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .map_err(|err| FetchFailure::Unreachable(err.to_string()))?;
        let response = response
            .error_for_status()
            .map_err(|err| FetchFailure::Unreachable(err.to_string()))?;
        let bytes = response
            .bytes()
            .map_err(|err| FetchFailure::Unreachable(err.to_string()))?;
        ReleaseDocument::from_slice(&bytes)
            .with_context(|| format!("invalid release catalog returned by {}", self.url))
            .map_err(FetchFailure::Invalid)
    }
}

impl ReleaseCatalog for HttpCatalog {
    fn fetch(&self) -> Result<Vec<ReleaseDescriptor>> {
        let document = match self.fetch_document() {
            Ok(document) => {
                debug!(
                    tag = document.tag_name.as_deref().unwrap_or("unknown"),
                    "fetched release catalog"
                );
                document
            }
            Err(FetchFailure::Unreachable(reason)) => {
                warn!("cannot connect to release API; using fallback json data: {reason}");
                read_fallback_document()?
            }
            Err(FetchFailure::Invalid(err)) => return Err(err),
        };
        Ok(document.descriptors()?)
    }
}
