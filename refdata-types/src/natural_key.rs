//! Natural (business) keys.
//!
//! A snapshot built from the source and a snapshot built from the store are
//! compared by key equality, so the key must be a pure function of domain
//! fields and both sides must derive it through the same implementation.

use std::fmt;
use std::hash::Hash;

/// Builds the business key that identifies a record within one entity type.
pub trait NaturalKey {
    type Key: Eq + Hash + Clone + fmt::Display + fmt::Debug + Send + Sync;

    fn natural_key(&self) -> Self::Key;
}

/// A synced reference entity.
pub trait Entity: NaturalKey + Clone + fmt::Debug + Send + Sync + 'static {
    /// Plural name used in logs and errors.
    const NAME: &'static str;

    /// Field-level equality deciding whether a stored record needs an update.
    /// Identity and audit timestamps are never compared.
    fn same_values(&self, other: &Self) -> bool;
}
