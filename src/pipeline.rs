//! End-to-end geosite build.

use std::fs;
use std::path::PathBuf;

use crate::aggregate::aggregate;
use crate::fetch::{FetcherConfig, ListFetcher};
use crate::geosite::{sha256_hex, write_atomic, write_checksum, GeoSiteWriter};
use crate::orchestrator::fetch_all;
use crate::source::SourceList;
use crate::{Error, Result};

/// Settings for one build run.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// File listing `LABEL,URL` sources
    pub source_file: PathBuf,
    /// Directory the database is written to; created if missing
    pub output_dir: PathBuf,
    /// File name of the database inside `output_dir`
    pub output_name: String,
    /// Fail the run when the source file has malformed lines
    pub strict: bool,
    /// Also write `<output>.sha256sum`
    pub write_checksum: bool,
    /// HTTP settings for list downloads
    pub fetcher: FetcherConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_file: PathBuf::from("urls.txt"),
            output_dir: PathBuf::from("./output"),
            output_name: "geosite.dat".to_string(),
            strict: false,
            write_checksum: false,
            fetcher: FetcherConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Full path of the database file.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_name)
    }
}

/// Summary of a successful build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub output_path: PathBuf,
    pub checksum_path: Option<PathBuf>,
    pub groups: usize,
    pub domains: usize,
    /// Invalid lines dropped from downloaded lists
    pub warnings: usize,
    /// Malformed lines skipped in the source file
    pub rejected_sources: usize,
    pub bytes: usize,
    pub sha256: String,
}

/// Download every source, build the database and write it.
///
/// Nothing is written unless every source downloaded successfully.
pub async fn run(config: &BuildConfig) -> Result<BuildReport> {
    let list = SourceList::load(&config.source_file)?;
    fs::create_dir_all(&config.output_dir).map_err(|e| {
        Error::Config(format!(
            "cannot create output directory {:?}: {}",
            config.output_dir, e
        ))
    })?;

    if list.is_empty() {
        log::warn!("No sources in {:?}", config.source_file);
    }
    log::info!(
        "Loaded {} sources from {:?} ({} malformed)",
        list.len(),
        config.source_file,
        list.rejected.len()
    );

    let fetcher = ListFetcher::new(&config.fetcher)?;
    let report = fetch_all(&fetcher, &list.sources).await;
    let warnings = report.warnings;
    let outcomes = report.into_result()?;

    let rejected_sources = list.rejected.len();
    if config.strict && rejected_sources > 0 {
        return Err(Error::MalformedSources(list.rejected));
    }

    let db = aggregate(outcomes);
    let data = GeoSiteWriter::new().encode(&db)?;
    let output_path = config.output_path();
    write_atomic(&data, &output_path)?;

    let sha256 = sha256_hex(&data);
    let checksum_path = if config.write_checksum {
        Some(write_checksum(&output_path, &sha256)?)
    } else {
        None
    };

    log::info!(
        "Wrote {:?}: {} groups, {} domains, {} bytes, sha256 {}",
        output_path,
        db.len(),
        db.domain_count(),
        data.len(),
        sha256
    );

    Ok(BuildReport {
        output_path,
        checksum_path,
        groups: db.len(),
        domains: db.domain_count(),
        warnings,
        rejected_sources,
        bytes: data.len(),
        sha256,
    })
}
