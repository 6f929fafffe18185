//! Merge fetched ranges into the configuration's alias list.
//!
//! Each selected range ends up represented by exactly one alias record. Records
//! are inserted or replaced in place; nothing is ever removed.

use crate::ranges::RangeEntry;
use crate::Result;
use fauxapi_core::document::alias_field;
use fauxapi_core::{AliasRecord, ConfigDocument};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Filter value that selects everything.
pub const WILDCARD: &str = "*";

/// Prefix of each per-address annotation in the `detail` field.
pub const CREATE_DATE_ANNOTATION: &str = "ip-ranges.json createDate: ";

/// Separator between per-address annotations.
pub const DETAIL_SEPARATOR: &str = "||";

/// Which ranges to synchronise and which address families to include.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasFilter {
    /// Region pattern, e.g. `ap-*`, or [`WILDCARD`].
    pub regions: String,
    /// Service pattern, e.g. `ec2`, or [`WILDCARD`].
    pub services: String,
    /// Include IPv4 prefixes.
    pub ipv4: bool,
    /// Include IPv6 prefixes.
    pub ipv6: bool,
}

impl Default for AliasFilter {
    fn default() -> Self {
        Self::new(WILDCARD, WILDCARD)
    }
}

impl AliasFilter {
    /// Filter on region and service patterns, both address families included.
    #[must_use]
    pub fn new(regions: impl Into<String>, services: impl Into<String>) -> Self {
        Self {
            regions: regions.into(),
            services: services.into(),
            ipv4: true,
            ipv6: true,
        }
    }

    /// Include or exclude IPv4 prefixes.
    #[must_use]
    pub const fn with_ipv4(mut self, include: bool) -> Self {
        self.ipv4 = include;
        self
    }

    /// Include or exclude IPv6 prefixes.
    #[must_use]
    pub const fn with_ipv6(mut self, include: bool) -> Self {
        self.ipv6 = include;
        self
    }

    /// True when the alias `name` is selected by both patterns.
    ///
    /// Each pattern is reduced by stripping `*` and its separator (`-` for
    /// regions, `_` for services) and lower-casing, then matched as a substring
    /// of the whole name.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        pattern_matches(&self.regions, '-', name) && pattern_matches(&self.services, '_', name)
    }

    /// Requested addresses of `entry` in lexicographic order.
    #[must_use]
    pub fn addresses(&self, entry: &RangeEntry) -> Vec<String> {
        let mut addresses = Vec::new();
        if self.ipv4 {
            addresses.extend(entry.ipv4.iter().cloned());
        }
        if self.ipv6 {
            addresses.extend(entry.ipv6.iter().cloned());
        }
        addresses.sort();
        addresses
    }

    /// Build the alias record `entry` should be represented by.
    #[must_use]
    pub fn candidate(&self, name: &str, entry: &RangeEntry) -> AliasRecord {
        let addresses = self.addresses(entry);
        let annotation = format!("{CREATE_DATE_ANNOTATION}{}", entry.aws_create_date);
        let detail = vec![annotation; addresses.len()].join(DETAIL_SEPARATOR);

        AliasRecord::network(name, addresses.join(" "), entry.description.as_str(), detail)
    }
}

fn pattern_matches(pattern: &str, separator: char, name: &str) -> bool {
    if pattern == WILDCARD {
        return true;
    }
    let needle = pattern
        .replace('*', "")
        .replace(separator, "")
        .to_lowercase();
    name.contains(&needle)
}

/// What happened to a single candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Appended to the end of the alias list.
    Inserted,
    /// Replaced an existing record with different addresses.
    Updated,
    /// An existing record already had the same addresses.
    Unchanged,
}

/// Names touched by a reconciliation pass, grouped by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Newly appended aliases.
    pub inserted: Vec<String>,
    /// Aliases replaced in place.
    pub updated: Vec<String>,
    /// Aliases left as they were.
    pub unchanged: Vec<String>,
}

impl ReconcileReport {
    /// True if the document was modified.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        !self.inserted.is_empty() || !self.updated.is_empty()
    }

    /// Number of selected ranges.
    #[must_use]
    pub fn total(&self) -> usize {
        self.inserted.len() + self.updated.len() + self.unchanged.len()
    }

    fn record(&mut self, name: String, outcome: ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Inserted => self.inserted.push(name),
            ReconcileOutcome::Updated => self.updated.push(name),
            ReconcileOutcome::Unchanged => self.unchanged.push(name),
        }
    }
}

/// Applies ranges to a borrowed configuration document.
#[derive(Debug)]
pub struct AliasReconciler<'a> {
    document: &'a mut ConfigDocument,
}

impl<'a> AliasReconciler<'a> {
    /// Reconcile into `document`.
    pub fn new(document: &'a mut ConfigDocument) -> Self {
        Self { document }
    }

    /// Upsert an alias for every range selected by `filter`, in name order.
    ///
    /// # Errors
    ///
    /// Returns an error if the alias section cannot be prepared.
    pub fn apply(
        &mut self,
        ranges: &BTreeMap<String, RangeEntry>,
        filter: &AliasFilter,
    ) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        for (name, entry) in ranges.iter().filter(|(name, _)| filter.matches(name)) {
            let outcome = self.upsert(filter.candidate(name, entry))?;
            debug!(alias = %name, ?outcome, "Reconciled alias");
            report.record(name.clone(), outcome);
        }

        info!(
            inserted = report.inserted.len(),
            updated = report.updated.len(),
            unchanged = report.unchanged.len(),
            "Alias reconciliation complete"
        );
        Ok(report)
    }

    /// Insert `candidate`, or replace the first record with the same name when
    /// its address differs.
    ///
    /// # Errors
    ///
    /// Returns an error if the alias section cannot be prepared.
    pub fn upsert(&mut self, candidate: AliasRecord) -> Result<ReconcileOutcome> {
        let existing = self.document.find_alias(&candidate.name);
        let aliases = self.document.aliases_mut()?;

        let outcome = match existing {
            Some(index) => {
                if alias_field(&aliases[index], "address") == Some(candidate.address.as_str()) {
                    ReconcileOutcome::Unchanged
                } else {
                    aliases[index] = candidate.to_value();
                    ReconcileOutcome::Updated
                }
            }
            None => {
                aliases.push(candidate.to_value());
                ReconcileOutcome::Inserted
            }
        };

        Ok(outcome)
    }
}
