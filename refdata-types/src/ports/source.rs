//! Reference data source port.
//!
//! This trait defines the interface for publishers of reference data.
//! Implementations can be HTTP clients, fixture providers, etc.

use crate::domain::{Currency, ExchangeRateFilter, SourceExchangeRate};

/// Error type for source operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Source returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No data: {0}")]
    NoData(String),
}

/// Port trait for reference data publishers.
#[async_trait::async_trait]
pub trait ReferenceSource: Send + Sync {
    /// Fetches every currency quoted against `base`, including `base` itself.
    async fn fetch_currencies(&self, base: &str) -> Result<Vec<Currency>, SourceError>;

    /// Fetches the rates from `filter.base` to every other currency within the
    /// filter's date range.
    async fn fetch_exchange_rates(
        &self,
        filter: &ExchangeRateFilter,
    ) -> Result<Vec<SourceExchangeRate>, SourceError>;
}

#[async_trait::async_trait]
impl<T: ReferenceSource + ?Sized> ReferenceSource for std::sync::Arc<T> {
    async fn fetch_currencies(&self, base: &str) -> Result<Vec<Currency>, SourceError> {
        (**self).fetch_currencies(base).await
    }

    async fn fetch_exchange_rates(
        &self,
        filter: &ExchangeRateFilter,
    ) -> Result<Vec<SourceExchangeRate>, SourceError> {
        (**self).fetch_exchange_rates(filter).await
    }
}
