//! `geosite.dat` encoding and decoding.
//!
//! A geosite file is a protobuf `GeoSiteList`: an ordered collection of
//! groups, each with a label (`country_code`) and an ordered collection of
//! domain entries.
//!
//! # File Structure
//!
//! ```text
//! GeoSiteList
//! +-- entry (GeoSite)           repeated, sorted by label
//!     +-- country_code          "CN"
//!     +-- domain (Domain)       repeated, list order
//!         +-- type              Full (3)
//!         +-- value             "baidu.com"
//! ```

mod format;
mod reader;
pub mod writer;


pub use format::*;
pub use reader::{GeoSiteDomain, GeoSiteGroup, GeoSiteReader};
pub use writer::{sha256_hex, write_atomic, write_checksum, GeoSiteWriter};
