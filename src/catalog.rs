//! Catalog capability consumed by the import engine.
//!
//! The engine only sees `Catalog`; the Radarr HTTP client is one
//! implementation and tests supply an in-memory one.
use crate::error::CatalogError;
use serde_json::Value;
use std::collections::BTreeSet;

/// External identifier used for duplicate detection (TMDb id).
pub type CatalogId = u64;

/// Catalog ids already present in the library, fetched once per run.
pub type LibrarySnapshot = BTreeSet<CatalogId>;

/// A lookup match. `raw` carries the service's full record for the add call.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMovie {
    pub catalog_id: CatalogId,
    pub title: String,
    pub year: i32,
    pub raw: Value,
}

impl CandidateMovie {
    pub fn new(catalog_id: CatalogId, title: impl Into<String>, year: i32) -> Self {
        Self {
            catalog_id,
            title: title.into(),
            year,
            raw: Value::Null,
        }
    }

    /// Build a candidate from a lookup result; results without a usable
    /// `tmdbId` are not addable and yield `None`.
    pub fn from_lookup(raw: Value) -> Option<Self> {
        let catalog_id = raw.get("tmdbId").and_then(Value::as_u64).filter(|id| *id > 0)?;
        let title = raw
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        let year = raw
            .get("year")
            .and_then(Value::as_i64)
            .and_then(|year| i32::try_from(year).ok())
            .unwrap_or_default();
        Some(Self {
            raw,
            ..Self::new(catalog_id, title, year)
        })
    }

    /// `Title (Year) tmdb:ID`, the form used in logs and prompts.
    pub fn label(&self) -> String {
        format!("{} ({}) tmdb:{}", self.title, self.year, self.catalog_id)
    }
}

/// Where and how an added movie is placed in the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOptions {
    pub root_folder: String,
    pub quality_profile_id: i64,
    pub monitored: bool,
    pub search_on_add: bool,
}

pub trait Catalog {
    fn lookup(&self, title: &str) -> Result<Vec<CandidateMovie>, CatalogError>;

    fn library_snapshot(&self) -> Result<LibrarySnapshot, CatalogError>;

    fn add_movie(
        &self,
        candidate: &CandidateMovie,
        options: &AddOptions,
    ) -> Result<(), CatalogError>;
}
