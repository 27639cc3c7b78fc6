//! Geosite file reader.

use prost::Message;
use std::fs;
use std::path::Path;

use super::format::*;
use crate::{Error, Result};

/// One domain entry of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoSiteDomain {
    pub kind: DomainType,
    pub value: String,
}

/// One `GeoSite` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoSiteGroup {
    pub label: String,
    pub domains: Vec<GeoSiteDomain>,
}

impl TryFrom<GeoSite> for GeoSiteGroup {
    type Error = Error;

    fn try_from(site: GeoSite) -> Result<Self> {
        let mut domains = Vec::with_capacity(site.domain.len());
        for domain in site.domain {
            let kind = DomainType::try_from(domain.r#type).map_err(|_| Error::UnknownDomainType {
                label: site.country_code.clone(),
                value: domain.r#type,
            })?;
            domains.push(GeoSiteDomain {
                kind,
                value: domain.value,
            });
        }

        Ok(Self {
            label: site.country_code,
            domains,
        })
    }
}

/// Decoder for `geosite.dat` files.
///
/// Unknown fields (attributes, resource hashes, file paths) are skipped.
pub struct GeoSiteReader;

impl GeoSiteReader {
    /// Read and decode a geosite file.
    pub fn open(path: &Path) -> Result<Vec<GeoSiteGroup>> {
        let data = fs::read(path)?;
        Self::decode(&data)
    }

    /// Decode a `GeoSiteList` message.
    pub fn decode(data: &[u8]) -> Result<Vec<GeoSiteGroup>> {
        GeoSiteList::decode(data)?
            .entry
            .into_iter()
            .map(GeoSiteGroup::try_from)
            .collect()
    }
}
