use std::collections::HashSet;

use crate::models::ListingId;

/// Identifiers already delivered during this run.
///
/// Grows monotonically and is never persisted: a restarted harvester starts
/// empty and may deliver listings again. Very long runs grow it without bound.
#[derive(Debug, Default)]
pub struct SeenSet {
    ids: HashSet<ListingId>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &ListingId) -> bool {
        self.ids.contains(id)
    }

    /// Returns `false` if the identifier was already present.
    pub fn mark_seen(&mut self, id: ListingId) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
