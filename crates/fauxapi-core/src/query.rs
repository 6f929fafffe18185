//! Query string of a FauxAPI request.
//!
//! Every request names its `action` first; action-specific pairs follow in
//! insertion order and optional ones are left out entirely when unset.

use std::fmt::Display;

/// A single `key=value` query pair.
pub type QueryPair = (&'static str, String);

/// Ordered query pairs headed by `action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionQuery {
    pairs: Vec<QueryPair>,
}

impl ActionQuery {
    /// Query for `action` with no further pairs.
    #[must_use]
    pub fn new(action: &str) -> Self {
        Self {
            pairs: vec![("action", action.to_string())],
        }
    }

    /// Append `key=value`.
    #[must_use]
    pub fn with(mut self, key: &'static str, value: impl Display) -> Self {
        self.pairs.push((key, value.to_string()));
        self
    }

    /// Append `key=value` only when `value` is present.
    #[must_use]
    pub fn with_opt<T: Display>(self, key: &'static str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    /// Pairs in the order they go on the wire.
    #[must_use]
    pub fn as_pairs(&self) -> &[QueryPair] {
        &self.pairs
    }
}
