//! Store-assigned identity and persisted records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::natural_key::NaturalKey;

/// Surrogate identifier assigned by the store.
///
/// Never produced by a source; two snapshots are matched by natural key only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Records that carry a store identity.
pub trait Identified {
    fn id(&self) -> RecordId;
}

/// A record as read back from the store: domain fields plus identity and
/// audit timestamps. Neither identity nor timestamps take part in equality
/// checks during reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persisted<T> {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: T,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> Persisted<T> {
    /// Wraps fields with an identity and no audit timestamps.
    pub fn new(id: RecordId, fields: T) -> Self {
        Self {
            id,
            fields,
            created_at: None,
            updated_at: None,
        }
    }

    /// Creates a record with all fields specified (for database reconstruction).
    pub fn from_parts(
        id: RecordId,
        fields: T,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            fields,
            created_at,
            updated_at,
        }
    }
}

impl<T> Identified for Persisted<T> {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl<T: NaturalKey> NaturalKey for Persisted<T> {
    type Key = T::Key;

    fn natural_key(&self) -> Self::Key {
        self.fields.natural_key()
    }
}
