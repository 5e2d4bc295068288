//! Natural-key reconciliation of two snapshots.
//!
//! Given the authoritative source snapshot and the snapshot read from the
//! store, [`diff`] computes the minimal set of inserts, updates and deletes
//! that brings the store in line with the source. Records are matched by
//! natural key only; the equality predicate decides whether a matched pair
//! needs an update.

use std::collections::HashMap;

use crate::domain::{Identified, RecordId};
use crate::natural_key::NaturalKey;
use crate::snapshot::Snapshot;

/// Outcome of a reconciliation. A natural key appears in at most one of the
/// three collections; keys present in none are unchanged.
#[derive(Debug, Clone)]
pub struct DiffResult<S, P> {
    /// Source records with no stored counterpart
    pub to_insert: Vec<S>,
    /// New field values, keyed by the identity of the stored record they replace
    pub to_update: HashMap<RecordId, S>,
    /// Stored records with no source counterpart
    pub to_delete: Vec<P>,
    /// Number of keys present on both sides with equal values
    pub unchanged: usize,
}

impl<S, P> DiffResult<S, P> {
    /// True when the store already matches the source.
    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    /// Sizes of the (insert, update, delete) sets.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.to_insert.len(), self.to_update.len(), self.to_delete.len())
    }
}

/// Computes the insert/update/delete sets between `source` and `store`.
///
/// Runs in O(|source| + |store|) with hash lookups. An empty source is legal
/// and marks every stored record for deletion; guarding against implausible
/// wipes is the caller's decision.
pub fn diff<S, P, F>(source: &Snapshot<S>, store: &Snapshot<P>, equal: F) -> DiffResult<S, P>
where
    S: NaturalKey + Clone,
    P: NaturalKey<Key = S::Key> + Identified + Clone,
    F: Fn(&S, &P) -> bool,
{
    let mut result = DiffResult {
        to_insert: Vec::new(),
        to_update: HashMap::new(),
        to_delete: Vec::new(),
        unchanged: 0,
    };

    for (key, source_record) in source.iter() {
        match store.get(key) {
            None => result.to_insert.push(source_record.clone()),
            Some(store_record) if !equal(source_record, store_record) => {
                result
                    .to_update
                    .insert(store_record.id(), source_record.clone());
            }
            Some(_) => result.unchanged += 1,
        }
    }

    for (key, store_record) in store.iter() {
        if !source.contains_key(key) {
            result.to_delete.push(store_record.clone());
        }
    }

    result
}
