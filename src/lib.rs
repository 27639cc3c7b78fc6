//! K2Geosite - Build V2Ray `geosite.dat` routing databases from remote domain lists.
//!
//! A source list maps category labels to URLs of plain-text domain lists.
//! Every list is downloaded concurrently, each line is validated and
//! normalized, and the result is grouped by label and encoded as a
//! protobuf `GeoSiteList` for the downstream routing engine.
//!
//! # Quick Start
//!
//! ```ignore
//! use k2geosite::{run, BuildConfig};
//! use std::path::PathBuf;
//!
//! let config = BuildConfig {
//!     source_file: PathBuf::from("urls.txt"),
//!     ..BuildConfig::default()
//! };
//!
//! let report = run(&config).await?;
//! println!("{} groups written to {:?}", report.groups, report.output_path);
//! ```
//!
//! # Source List Format
//!
//! ```text
//! # LABEL,URL
//! CN,https://example.com/cn.txt
//! ADS,https://example.com/ads.txt
//! ```
//!
//! # Failure Handling
//!
//! - **Malformed source line**: logged and skipped
//! - **Invalid domain line**: logged and skipped, the list continues
//! - **Failed download**: siblings keep running; the run fails once all
//!   downloads are over and nothing is written
//! - **Encode or write failure**: the run fails, no partial file is left

mod error;

pub mod aggregate;
pub mod domain;
pub mod fetch;
pub mod geosite;
pub mod orchestrator;
pub mod pipeline;
pub mod source;

// Re-export core types
pub use error::{BatchError, Error, FetchError, Result, SourceError};

pub use aggregate::{aggregate, GeoSiteDatabase};
pub use domain::{is_valid_domain, normalize_domain};
pub use fetch::{FetchedList, FetcherConfig, InvalidLine, LineTooLong, ListFetcher};
pub use geosite::{GeoSiteGroup, GeoSiteReader, GeoSiteWriter};
pub use orchestrator::{fetch_all, BatchReport, FetchOutcome};
pub use pipeline::{run, BuildConfig, BuildReport};
pub use source::{parse_source_line, Source, SourceList};
