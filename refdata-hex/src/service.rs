//! Reference Data Application Services
//!
//! Orchestrates sync runs and rate lookups through the repository and
//! source ports. Contains NO infrastructure logic.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;

use refdata_types::{
    AppError, Currency, Entity, ExchangeRate, ExchangeRateFilter, Persisted, RateSeries,
    ReferenceRepository, ReferenceSource, Snapshot, StalenessBound, SyncError, SyncSummary,
};

use crate::sync::{ReconcileOptions, reconcile};

// ─────────────────────────────────────────────────────────────────────────────
// Sync
// ─────────────────────────────────────────────────────────────────────────────

/// Application service that reconciles stored reference data with a source.
///
/// Generic over the repository and source ports; callers must not run two
/// syncs of the same entity type concurrently.
pub struct SyncService<R: ReferenceRepository, S: ReferenceSource> {
    repo: Arc<R>,
    source: S,
    options: ReconcileOptions,
}

impl<R: ReferenceRepository, S: ReferenceSource> SyncService<R, S> {
    /// Creates a new sync service.
    pub fn new(repo: Arc<R>, source: S) -> Self {
        Self {
            repo,
            source,
            options: ReconcileOptions::default(),
        }
    }

    /// Overrides the reconciliation options.
    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Brings stored currencies in line with those quoted against `base`.
    #[tracing::instrument(skip(self))]
    pub async fn sync_currencies(&self, base: &str) -> Result<SyncSummary, SyncError> {
        let fetched = self.source.fetch_currencies(base).await?;
        let source = Snapshot::from_records(fetched)?;

        let stored = self
            .repo
            .list_currencies()
            .await
            .map_err(|source| SyncError::Snapshot {
                entity: Currency::NAME,
                source,
            })?;
        let store = Snapshot::from_records(stored)?;

        reconcile(source, store, self.repo.as_ref(), self.options).await
    }

    /// Brings stored rates for one base, frequency and date range in line with
    /// the source. Currencies must have been synced first.
    #[tracing::instrument(skip(self, filter), fields(base = %filter.base, frequency = %filter.frequency, start = %filter.start, end = %filter.end))]
    pub async fn sync_exchange_rates(
        &self,
        filter: &ExchangeRateFilter,
    ) -> Result<SyncSummary, SyncError> {
        let codes = self
            .repo
            .currency_code_map()
            .await
            .map_err(|source| SyncError::Snapshot {
                entity: Currency::NAME,
                source,
            })?;
        if codes.is_empty() {
            return Err(SyncError::NoCurrencies);
        }

        let fetched = self.source.fetch_exchange_rates(filter).await?;
        let resolved = fetched
            .iter()
            .map(|rate| rate.resolve(&codes))
            .collect::<Result<Vec<ExchangeRate>, _>>()?;
        let source = Snapshot::from_records(resolved)?;

        let stored = self
            .repo
            .list_exchange_rates(&filter.aligned())
            .await
            .map_err(|source| SyncError::Snapshot {
                entity: ExchangeRate::NAME,
                source,
            })?;
        let store = Snapshot::from_records(stored)?;

        reconcile(source, store, self.repo.as_ref(), self.options).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lookups
// ─────────────────────────────────────────────────────────────────────────────

/// Read-side service: stored currencies and carry-forward rate lookups.
pub struct RateService<R: ReferenceRepository> {
    repo: Arc<R>,
    bound: StalenessBound,
}

impl<R: ReferenceRepository> RateService<R> {
    /// Creates a new rate service with the default staleness bound.
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            bound: StalenessBound::DEFAULT,
        }
    }

    /// Overrides the staleness bound.
    pub fn with_bound(mut self, bound: StalenessBound) -> Self {
        self.bound = bound;
        self
    }

    /// Lists all stored currencies.
    pub async fn list_currencies(&self) -> Result<Vec<Persisted<Currency>>, AppError> {
        self.repo.list_currencies().await.map_err(Into::into)
    }

    /// Returns the daily rate in force on `day`, carrying the newest earlier
    /// observation forward over weekends and holidays.
    #[tracing::instrument(skip(self))]
    pub async fn latest_daily(&self, from: &str, to: &str, day: NaiveDate) -> Result<f64, AppError> {
        check_codes(from, to)?;

        let point = self.repo.latest_daily_point(from, to, day).await?;
        let series = RateSeries::from_descending(point.into_iter().collect());

        exchange_rates::latest(&series, day, self.bound).map_err(Into::into)
    }

    /// Returns one daily rate per calendar day in `[start, end]`.
    #[tracing::instrument(skip(self))]
    pub async fn daily_range(
        &self,
        from: &str,
        to: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, f64>, AppError> {
        check_codes(from, to)?;
        if start > end {
            return Err(AppError::BadRequest(format!(
                "start {start} must not be after end {end}"
            )));
        }

        let points = self
            .repo
            .daily_series(from, to, self.bound.fetch_start(start), end)
            .await?;
        let series = RateSeries::from_descending(points);

        exchange_rates::fill_range(&series, start, end, self.bound).map_err(Into::into)
    }
}

fn check_codes(from: &str, to: &str) -> Result<(), AppError> {
    if from.trim().is_empty() || to.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Both currency codes are required".into(),
        ));
    }
    Ok(())
}
