//! Message definitions for `geosite.dat`.
//!
//! The file is a protobuf-encoded `GeoSiteList` from V2Ray's
//! `routercommon` package:
//!
//! ```text
//! message Domain {
//!   enum Type { Plain = 0; Regex = 1; RootDomain = 2; Full = 3; }
//!   Type type = 1;
//!   string value = 2;
//!   repeated Attribute attribute = 3;
//! }
//! message GeoSite     { string country_code = 1; repeated Domain domain = 2; }
//! message GeoSiteList { repeated GeoSite entry = 1; }
//! ```
//!
//! Only the fields this crate reads or writes are declared; prost skips the
//! rest (`attribute`, `resource_hash`, `file_path`) when decoding.

use std::fmt;

/// Largest message protobuf implementations accept (2 GiB - 1).
pub const MAX_MESSAGE_SIZE: usize = i32::MAX as usize;

/// Match kind of a domain entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum DomainType {
    /// Keyword (substring) match
    Plain = 0,
    /// Regular expression match
    Regex = 1,
    /// Domain and all of its subdomains
    RootDomain = 2,
    /// Exact domain only
    Full = 3,
}

impl DomainType {
    /// Prefix used by V2Ray's text rule syntax.
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainType::Plain => "keyword",
            DomainType::Regex => "regexp",
            DomainType::RootDomain => "domain",
            DomainType::Full => "full",
        }
    }
}

impl fmt::Display for DomainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `routercommon.Domain`
#[derive(Clone, PartialEq, prost::Message)]
pub struct Domain {
    #[prost(enumeration = "DomainType", tag = "1")]
    pub r#type: i32,
    #[prost(string, tag = "2")]
    pub value: String,
}

/// `routercommon.GeoSite`
#[derive(Clone, PartialEq, prost::Message)]
pub struct GeoSite {
    #[prost(string, tag = "1")]
    pub country_code: String,
    #[prost(message, repeated, tag = "2")]
    pub domain: Vec<Domain>,
}

/// `routercommon.GeoSiteList`
#[derive(Clone, PartialEq, prost::Message)]
pub struct GeoSiteList {
    #[prost(message, repeated, tag = "1")]
    pub entry: Vec<GeoSite>,
}
