use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attribution;

const CATALOG_VERSION: &str = "1.0.0";

/// Sentinel some upstream providers store when no license URL is known.
const LICENSE_URL_UNSET: &str = "null";

/// A licensed creative work as indexed from upstream providers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    pub license: String,
    pub license_version: String,
    /// Raw stored value; may be missing or the literal `"null"` sentinel.
    /// Read through [`Work::license_url`] instead.
    #[serde(rename = "licenseUrl", skip_serializing_if = "Option::is_none")]
    pub raw_license_url: Option<String>,
    pub source: String,
    pub extension: String,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Work {
    /// Canonical license URL for this work.
    ///
    /// Never returns the stored unset sentinel: when the catalog carries no
    /// usable URL the Creative Commons deed URL is derived from the license
    /// code and version.
    pub fn license_url(&self) -> String {
        match &self.raw_license_url {
            Some(url) if !url.is_empty() && url != LICENSE_URL_UNSET => url.clone(),
            _ => attribution::canonical_license_url(&self.license, &self.license_version),
        }
    }

    /// Human-readable attribution string derived from this work's metadata.
    pub fn attribution(&self) -> String {
        attribution::attribution(
            self.title.as_deref(),
            self.creator.as_deref(),
            &self.license,
            &self.license_version,
            &self.license_url(),
        )
    }
}

/// Immutable corpus snapshot the search core reads from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub works: Vec<Work>,
}

impl CatalogSnapshot {
    pub fn new(works: Vec<Work>) -> Self {
        Self {
            version: CATALOG_VERSION.to_string(),
            generated_at: Utc::now(),
            works,
        }
    }
}

/// Read-only view of the JSON snapshot produced by the upstream catalog
/// build. The service never writes the catalog.
#[derive(Debug)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the catalog from disk, checking schema compatibility.
    pub fn load(&self) -> Result<CatalogSnapshot> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read catalog '{}'", self.path.display()))?;
        let snapshot: CatalogSnapshot =
            serde_json::from_str(&contents).context("failed to parse catalog json")?;
        if snapshot.version != CATALOG_VERSION {
            anyhow::bail!(
                "catalog schema mismatch (found {}, expected {})",
                snapshot.version,
                CATALOG_VERSION
            );
        }
        Ok(snapshot)
    }
}
