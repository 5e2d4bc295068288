//! Key-unique snapshots of an entity type.

use std::collections::HashMap;
use std::collections::hash_map;

use crate::error::DomainError;
use crate::natural_key::NaturalKey;

/// A complete point-in-time view of one entity type, keyed by natural key.
///
/// Keys are unique by construction: inserting a second record with the same
/// key is an error, never a silent overwrite.
#[derive(Debug, Clone)]
pub struct Snapshot<R: NaturalKey> {
    entries: HashMap<R::Key, R>,
}

impl<R: NaturalKey> Snapshot<R> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Builds a snapshot, failing on the first duplicate key.
    pub fn from_records<I>(records: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = R>,
    {
        let records = records.into_iter();
        let mut snapshot = Self {
            entries: HashMap::with_capacity(records.size_hint().0),
        };
        for record in records {
            snapshot.insert(record)?;
        }
        Ok(snapshot)
    }

    /// Adds a record under its natural key.
    pub fn insert(&mut self, record: R) -> Result<(), DomainError> {
        match self.entries.entry(record.natural_key()) {
            hash_map::Entry::Occupied(entry) => Err(DomainError::KeyCollision {
                key: entry.key().to_string(),
            }),
            hash_map::Entry::Vacant(entry) => {
                entry.insert(record);
                Ok(())
            }
        }
    }

    pub fn get(&self, key: &R::Key) -> Option<&R> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &R::Key) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, R::Key, R> {
        self.entries.iter()
    }

    pub fn keys(&self) -> hash_map::Keys<'_, R::Key, R> {
        self.entries.keys()
    }

    pub fn into_values(self) -> hash_map::IntoValues<R::Key, R> {
        self.entries.into_values()
    }
}

impl<R: NaturalKey> Default for Snapshot<R> {
    fn default() -> Self {
        Self::new()
    }
}
