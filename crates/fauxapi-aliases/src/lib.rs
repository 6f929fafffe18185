//! AWS IP range to pfSense alias synchronisation.
//!
//! The flow has three steps:
//!
//! - [`ranges`] downloads `ip-ranges.json` and groups prefixes by a derived alias name
//! - [`reconcile`] merges the selected ranges into the configuration's alias list
//! - [`sync`] loads the configuration, runs the reconciler and publishes the result

#![deny(missing_docs)]

pub mod ranges;
pub mod reconcile;
pub mod sync;

pub use ranges::{alias_name, flatten_ranges, IpRangesFetcher, RangeEntry, RangeSource};
pub use reconcile::{AliasFilter, AliasReconciler, ReconcileOutcome, ReconcileReport};
pub use sync::{AliasSync, ConfigStore, SyncOutcome};

/// Convenient result alias that reuses the shared FauxAPI error type.
pub type Result<T> = fauxapi_core::Result<T>;
