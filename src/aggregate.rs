//! In-memory geosite database built from download outcomes.

use std::collections::HashMap;

use crate::orchestrator::FetchOutcome;

/// Mapping from label to validated domains.
///
/// Insertion order is irrelevant; [`GeoSiteDatabase::groups`] always yields
/// labels in lexicographic order so the encoded file does not depend on which
/// download finished first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoSiteDatabase {
    groups: HashMap<String, Vec<String>>,
}

impl GeoSiteDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the domains of a label, replacing any previous list.
    pub fn insert(&mut self, label: impl Into<String>, domains: Vec<String>) -> Option<Vec<String>> {
        self.groups.insert(label.into(), domains)
    }

    /// Domains of a label in original order.
    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.groups.get(label).map(Vec::as_slice)
    }

    /// Groups sorted by label.
    pub fn groups(&self) -> Vec<(&str, &[String])> {
        let mut groups: Vec<_> = self
            .groups
            .iter()
            .map(|(label, domains)| (label.as_str(), domains.as_slice()))
            .collect();
        groups.sort_unstable_by(|a, b| a.0.cmp(b.0));
        groups
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the database has no labels.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of domains across all labels.
    pub fn domain_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Build a database from successful outcomes.
///
/// Failed outcomes are ignored. A label seen twice keeps the list of the
/// source that comes last in the source list, whatever the arrival order.
pub fn aggregate(outcomes: impl IntoIterator<Item = FetchOutcome>) -> GeoSiteDatabase {
    let mut outcomes: Vec<FetchOutcome> = outcomes.into_iter().collect();
    outcomes.sort_by_key(|outcome| outcome.index);

    let mut db = GeoSiteDatabase::new();
    for outcome in outcomes {
        if !outcome.is_success() {
            continue;
        }
        if db.insert(outcome.label.as_str(), outcome.domains).is_some() {
            log::warn!("Label {} appears more than once, keeping {}", outcome.label, outcome.url);
        }
    }
    db
}
