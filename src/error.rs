//! Error types for k2geosite.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for k2geosite operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Source list unreadable or output directory not creatable
    #[error("configuration error: {0}")]
    Config(String),

    /// Rejected source lines escalated in strict mode
    #[error("{} malformed source line(s): {}", .0.len(), join(.0))]
    MalformedSources(Vec<SourceError>),

    /// One or more sources failed to download
    #[error("{} source(s) failed to download: {}", .0.len(), join(.0))]
    FetchBatch(Vec<BatchError>),

    /// The database violates a limit of the geosite schema
    #[error("encode error: {0}")]
    Encode(String),

    /// A geosite file is not a valid `GeoSiteList`
    #[error("decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// A domain entry carries a match kind this crate does not know
    #[error("group {label:?} has a domain of unknown type {value}")]
    UnknownDomainType { label: String, value: i32 },

    /// The output file could not be written
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Result type alias for k2geosite operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for source list lines.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Line is not a `LABEL,URL` pair
    #[error("line {line_number}: {reason}: {line:?}")]
    Malformed {
        line_number: usize,
        line: String,
        reason: &'static str,
    },
}

/// Error type for a single list download.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Server answered with a non-2xx status
    #[error("GET {url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Request could not be sent or the connection failed
    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Body stream broke after a successful status
    #[error("reading body of {url} failed after {domains} domain(s): {reason}")]
    Read {
        url: String,
        domains: usize,
        reason: String,
    },

    /// Download task panicked or was aborted
    #[error("download task for {url} did not complete: {reason}")]
    Worker { url: String, reason: String },
}

/// A failed source, as collected by the orchestrator.
#[derive(Debug)]
pub struct BatchError {
    pub label: String,
    pub error: FetchError,
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.label, self.error)
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
