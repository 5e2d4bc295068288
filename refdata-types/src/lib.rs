//! # Reference Data Types
//!
//! Domain types, reconciliation core and port traits for syncing reference
//! data (currencies, exchange rates) from a publisher into a relational store.
//! This crate has ZERO external IO dependencies - only data structures,
//! pure algorithms, and trait definitions.
//!
//! ## Architecture
//!
//! - `domain/` - Pure domain types (Currency, ExchangeRate, Persisted)
//! - `natural_key` - Business keys used to match records across snapshots
//! - `snapshot` - Key-unique collections of records
//! - `diff` - Natural-key reconciliation of two snapshots
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto` - Data Transfer Objects for API boundaries
//! - `error` - Domain and application error types

pub mod diff;
pub mod domain;
pub mod dto;
pub mod error;
pub mod natural_key;
pub mod ports;
pub mod snapshot;

// Re-export commonly used types
pub use diff::{DiffResult, diff};
pub use domain::{
    Currency, DEFAULT_BASE_CURRENCY, ExchangeRate, ExchangeRateFilter, ExchangeRateKey, Frequency,
    Identified, Persisted, RecordId, SourceExchangeRate,
};
pub use dto::*;
pub use error::{AppError, DomainError, RepoError, SyncError, SyncPhase};
pub use natural_key::{Entity, NaturalKey};
pub use ports::{
    CurrencyRepository, EntityWriter, ExchangeRateRepository, ReferenceRepository,
    ReferenceSource, SourceError,
};
pub use snapshot::Snapshot;

pub use exchange_rates::{LookupError, RatePoint, RateSeries, StalenessBound};
