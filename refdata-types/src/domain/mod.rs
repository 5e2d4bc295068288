//! Domain models for reference-data sync.

pub mod currency;
pub mod exchange_rate;
pub mod record;

pub use currency::{Currency, DEFAULT_BASE_CURRENCY};
pub use exchange_rate::{
    ExchangeRate, ExchangeRateFilter, ExchangeRateKey, Frequency, SourceExchangeRate,
};
pub use record::{Identified, Persisted, RecordId};
