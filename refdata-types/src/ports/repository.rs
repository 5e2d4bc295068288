//! Repository port traits.
//!
//! Adapters (Postgres, SQLite) implement these traits. Each mutator call is
//! independent; the sync orchestrator decides ordering and failure policy.

use std::collections::HashMap;

use chrono::NaiveDate;
use exchange_rates::RatePoint;

use crate::domain::{Currency, ExchangeRate, ExchangeRateFilter, Persisted, RecordId};
use crate::error::RepoError;
use crate::natural_key::Entity;

/// Insert/update/delete primitives for one entity type.
#[async_trait::async_trait]
pub trait EntityWriter<T: Entity>: Send + Sync {
    /// Inserts a record and returns its new identity.
    async fn insert(&self, record: &T) -> Result<RecordId, RepoError>;

    /// Inserts a set of records, returning the number inserted.
    ///
    /// Adapters should override this with a single atomic bulk statement.
    async fn bulk_insert(&self, records: &[T]) -> Result<u64, RepoError> {
        let mut inserted = 0;
        for record in records {
            self.insert(record).await?;
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Replaces the domain fields of the record with the given identity.
    /// Fails with `RepoError::NotFound` if no such record exists.
    async fn update(&self, id: RecordId, record: &T) -> Result<(), RepoError>;

    /// Deletes the record with the given identity.
    /// Fails with `RepoError::NotFound` if no such record exists.
    async fn delete(&self, id: RecordId) -> Result<(), RepoError>;
}

/// Currency persistence.
#[async_trait::async_trait]
pub trait CurrencyRepository: EntityWriter<Currency> + 'static {
    /// Lists all stored currencies.
    async fn list_currencies(&self) -> Result<Vec<Persisted<Currency>>, RepoError>;

    /// Gets a currency by ID.
    async fn get_currency(&self, id: RecordId) -> Result<Option<Persisted<Currency>>, RepoError>;

    /// Maps currency codes to store identities.
    async fn currency_code_map(&self) -> Result<HashMap<String, RecordId>, RepoError> {
        Ok(self
            .list_currencies()
            .await?
            .into_iter()
            .map(|c| (c.fields.code, c.id))
            .collect())
    }
}

/// Exchange rate persistence and series queries.
#[async_trait::async_trait]
pub trait ExchangeRateRepository: EntityWriter<ExchangeRate> + 'static {
    /// Lists stored rates for one base currency and frequency within an
    /// inclusive day range.
    async fn list_exchange_rates(
        &self,
        filter: &ExchangeRateFilter,
    ) -> Result<Vec<Persisted<ExchangeRate>>, RepoError>;

    /// Returns the newest daily rate between two currency codes on or before `day`.
    async fn latest_daily_point(
        &self,
        from: &str,
        to: &str,
        day: NaiveDate,
    ) -> Result<Option<RatePoint>, RepoError>;

    /// Returns daily rates between two currency codes within `[start, end]`,
    /// ordered descending by day.
    async fn daily_series(
        &self,
        from: &str,
        to: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RatePoint>, RepoError>;
}

/// Everything the reference-data services need from persistence.
pub trait ReferenceRepository: CurrencyRepository + ExchangeRateRepository {}

impl<T: CurrencyRepository + ExchangeRateRepository> ReferenceRepository for T {}
