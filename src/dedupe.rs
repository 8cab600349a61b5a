use std::collections::HashSet;

use crate::models::IdentityKey;

/// Remembers which students were already written for one class.
///
/// A student listed under several academic plans appears once per plan in the
/// export; only the first of those rows is kept.
#[derive(Debug, Default)]
pub struct IdentityDeduplicator {
    seen: HashSet<IdentityKey>,
}

impl IdentityDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true and records the key the first time it is seen.
    pub fn admit(&mut self, key: IdentityKey) -> bool {
        self.seen.insert(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
