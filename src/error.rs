//! Error taxonomy for the import run.
//!
//! Per-line failures (`LookupError`, `AddError`) are recorded and the run
//! continues. `ResumeStoreError` and `ReportError` halt the run because the
//! cursor can no longer be trusted. `ConfigError` is downgraded to absence by
//! the loaders' callers.
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by the catalog capability.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("API key rejected (401 Unauthorized)")]
    Unauthorized,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
}

impl CatalogError {
    /// Failures that would repeat identically for every remaining line.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CatalogError::Unauthorized)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("lookup failed: {0}")]
pub struct LookupError(#[from] pub CatalogError);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("add rejected: {0}")]
pub struct AddError(#[from] pub CatalogError);

#[derive(Debug, Error)]
pub enum ResumeStoreError {
    #[error("write resume cursor {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialize resume cursor: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("read report {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("write report {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialize report entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reasons the import loop stops before reaching the end of the list.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("line {line_no}: {source}")]
    Catalog {
        line_no: usize,
        #[source]
        source: CatalogError,
    },
    #[error(transparent)]
    Resume(#[from] ResumeStoreError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("operator prompt failed: {0}")]
    Prompt(#[from] std::io::Error),
}
