//! Geosite file writer.

use prost::Message;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::format::*;
use crate::aggregate::GeoSiteDatabase;
use crate::{Error, Result};

/// Encodes a [`GeoSiteDatabase`] as a `GeoSiteList`.
///
/// Groups are written in label order and domains in their stored order, so
/// the same database always encodes to the same bytes. Every domain is
/// written as a [`DomainType::Full`] entry.
#[derive(Debug, Default)]
pub struct GeoSiteWriter;

impl GeoSiteWriter {
    /// Create a new writer.
    pub fn new() -> Self {
        Self
    }

    /// Encode the database.
    pub fn encode(&self, db: &GeoSiteDatabase) -> Result<Vec<u8>> {
        let entry = db
            .groups()
            .into_iter()
            .map(|(label, domains)| site(label, domains))
            .collect::<Result<Vec<_>>>()?;
        let list = GeoSiteList { entry };

        let len = list.encoded_len();
        if len > MAX_MESSAGE_SIZE {
            return Err(Error::Encode(format!(
                "GeoSiteList is {} bytes, exceeds the {} byte protobuf limit",
                len, MAX_MESSAGE_SIZE
            )));
        }

        Ok(list.encode_to_vec())
    }
}

fn site(label: &str, domains: &[String]) -> Result<GeoSite> {
    if label.is_empty() {
        return Err(Error::Encode("GeoSite country_code must not be empty".to_string()));
    }

    Ok(GeoSite {
        country_code: label.to_string(),
        domain: domains
            .iter()
            .map(|value| Domain {
                r#type: DomainType::Full as i32,
                value: value.clone(),
            })
            .collect(),
    })
}

/// Write `data` to `path` so that the file is either complete or untouched.
///
/// The bytes go to a temporary file next to `path` which is then renamed
/// over it.
pub fn write_atomic(data: &[u8], path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".geosite")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| write_error(path, e))?;
    tmp.write_all(data).map_err(|e| write_error(path, e))?;
    tmp.as_file().sync_all().map_err(|e| write_error(path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(|e| write_error(path, e))?;
    }

    tmp.persist(path).map_err(|e| write_error(path, e.error))?;
    Ok(())
}

fn write_error(path: &Path, source: std::io::Error) -> Error {
    Error::Write {
        path: path.to_path_buf(),
        source,
    }
}

/// Lower-case hex SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Write a `sha256sum`-compatible file next to `path`.
///
/// Returns the path of the checksum file.
pub fn write_checksum(path: &Path, digest: &str) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut sum_path = path.as_os_str().to_owned();
    sum_path.push(".sha256sum");
    let sum_path = PathBuf::from(sum_path);

    write_atomic(format!("{}  {}\n", digest, file_name).as_bytes(), &sum_path)?;
    Ok(sum_path)
}
