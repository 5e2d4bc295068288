//! Data Transfer Objects for API boundaries.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{DEFAULT_BASE_CURRENCY, ExchangeRateFilter, Frequency};

fn default_base() -> String {
    DEFAULT_BASE_CURRENCY.to_string()
}

/// Request to reconcile stored currencies with the source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncCurrenciesRequest {
    #[serde(default = "default_base")]
    pub base: String,
}

impl Default for SyncCurrenciesRequest {
    fn default() -> Self {
        Self {
            base: default_base(),
        }
    }
}

fn default_frequency() -> Frequency {
    Frequency::Daily
}

/// Request to reconcile stored exchange rates with the source over a range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRatesRequest {
    #[serde(default = "default_base")]
    pub base: String,
    #[serde(default = "default_frequency")]
    pub frequency: Frequency,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl From<SyncRatesRequest> for ExchangeRateFilter {
    fn from(req: SyncRatesRequest) -> Self {
        ExchangeRateFilter {
            base: req.base,
            frequency: req.frequency,
            start: req.start,
            end: req.end,
        }
    }
}

/// Per-phase counts of a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub entity: String,
    pub deleted: u64,
    pub inserted: u64,
    pub updated: u64,
    pub unchanged: u64,
}

impl SyncSummary {
    /// True when the run changed nothing.
    pub fn is_noop(&self) -> bool {
        self.deleted == 0 && self.inserted == 0 && self.updated == 0
    }
}

/// Query for the rate in force on one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestRateQuery {
    pub from: String,
    pub to: String,
    pub day: NaiveDate,
}

/// Rate in force on one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestRateResponse {
    pub from: String,
    pub to: String,
    pub day: NaiveDate,
    pub rate: f64,
}

/// Query for one rate per day over an inclusive range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateRangeQuery {
    pub from: String,
    pub to: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One rate per calendar day, keyed by ISO date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateRangeResponse {
    pub from: String,
    pub to: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rates: BTreeMap<NaiveDate, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_currencies_request_defaults_to_eur() {
        let req: SyncCurrenciesRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.base, "EUR");
    }

    #[test]
    fn test_sync_rates_request_defaults() {
        let req: SyncRatesRequest =
            serde_json::from_str(r#"{"start":"2024-09-02","end":"2024-09-06"}"#).unwrap();
        let filter = ExchangeRateFilter::from(req);
        assert_eq!(filter.base, "EUR");
        assert_eq!(filter.frequency, Frequency::Daily);
        assert_eq!(filter.end, NaiveDate::from_ymd_opt(2024, 9, 6).unwrap());
    }

    #[test]
    fn test_range_response_serializes_days_as_keys() {
        let day = NaiveDate::from_ymd_opt(2024, 9, 7).unwrap();
        let resp = RateRangeResponse {
            from: "EUR".into(),
            to: "USD".into(),
            start: day,
            end: day,
            rates: BTreeMap::from([(day, 1.1104)]),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["rates"]["2024-09-07"], 1.1104);
    }
}
