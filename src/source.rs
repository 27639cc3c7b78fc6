//! Source list parsing.
//!
//! A source list maps category labels to the URLs of plain-text domain lists:
//!
//! ```text
//! # label,url
//! CN,https://example.com/cn.txt
//! ads,https://example.com/ads.txt
//! ```
//!
//! Labels are case-insensitive and normalized to uppercase. Blank lines and
//! lines starting with `#` are ignored. A malformed line is reported and
//! skipped; it never stops the rest of the file from loading.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::SourceError;
use crate::{Error, Result};

/// One configured (label, URL) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Uppercase category label
    pub label: String,
    /// URL of the domain list
    pub url: String,
}

/// Parse a single `LABEL,URL` line.
///
/// `line_number` is only used for error reporting.
pub fn parse_source_line(line: &str, line_number: usize) -> std::result::Result<Source, SourceError> {
    let malformed = |reason| SourceError::Malformed {
        line_number,
        line: line.to_string(),
        reason,
    };

    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() != 2 {
        return Err(malformed("expected exactly two comma-separated fields LABEL,URL"));
    }

    let label = parts[0].trim();
    let url = parts[1].trim();

    if label.is_empty() {
        return Err(malformed("label must not be empty"));
    }
    if url.is_empty() {
        return Err(malformed("URL must not be empty"));
    }

    Ok(Source {
        label: label.to_uppercase(),
        url: url.to_string(),
    })
}

/// Parsed source list: accepted sources in file order plus rejected lines.
#[derive(Debug, Default)]
pub struct SourceList {
    pub sources: Vec<Source>,
    pub rejected: Vec<SourceError>,
}

impl SourceList {
    /// Load a source list from a file.
    ///
    /// Fails only if the file cannot be opened or read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::Config(format!("cannot open source list {:?}: {}", path, e)))?;
        Self::parse(file)
            .map_err(|e| Error::Config(format!("cannot read source list {:?}: {}", path, e)))
    }

    /// Parse a source list from a reader.
    pub fn parse<R: Read>(reader: R) -> std::io::Result<Self> {
        let mut list = Self::default();

        for (idx, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_source_line(line, idx + 1) {
                Ok(source) => list.sources.push(source),
                Err(e) => {
                    log::warn!("Skipping source: {}", e);
                    list.rejected.push(e);
                }
            }
        }

        Ok(list)
    }

    /// Number of accepted sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no source was accepted.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
