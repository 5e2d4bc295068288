//! Exchange rate domain model.

use std::collections::HashMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::record::RecordId;
use crate::error::DomainError;
use crate::natural_key::{Entity, NaturalKey};

/// Observation frequency of an exchange rate series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "D")]
    Daily,
    #[serde(rename = "M")]
    Monthly,
}

impl Frequency {
    /// Single-letter code used by the source and stored in the database.
    pub fn code(&self) -> &'static str {
        match self {
            Frequency::Daily => "D",
            Frequency::Monthly => "M",
        }
    }

    /// Format of a period label for this frequency.
    pub fn period_format(&self) -> &'static str {
        match self {
            Frequency::Daily => "%Y-%m-%d",
            Frequency::Monthly => "%Y-%m",
        }
    }

    /// Formats a day as a period label (`2024-09-03` or `2024-09`).
    pub fn format_period(&self, day: NaiveDate) -> String {
        day.format(self.period_format()).to_string()
    }

    /// First day of the period containing `day`.
    pub fn period_start(&self, day: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Daily => day,
            Frequency::Monthly => day.with_day(1).unwrap_or(day),
        }
    }

    /// Parses a period label. Monthly periods map to the first of the month.
    pub fn parse_period(&self, period: &str) -> Result<NaiveDate, DomainError> {
        let parsed = match self {
            Frequency::Daily => NaiveDate::parse_from_str(period, "%Y-%m-%d"),
            Frequency::Monthly => NaiveDate::parse_from_str(&format!("{}-01", period), "%Y-%m-%d"),
        };
        parsed.map_err(|e| {
            DomainError::Validation(format!("Invalid {} period '{}': {}", self, period, e))
        })
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "D" | "DAILY" => Ok(Frequency::Daily),
            "M" | "MONTHLY" => Ok(Frequency::Monthly),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

/// Natural key of an exchange rate: the day plus the target currency.
///
/// Base currency and frequency are not part of the key; snapshots are always
/// scoped to a single base and frequency before they are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExchangeRateKey {
    pub day: NaiveDate,
    pub to_currency_id: RecordId,
}

impl fmt::Display for ExchangeRateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.day.format("%Y-%m-%d"), self.to_currency_id)
    }
}

/// An exchange rate between two stored currencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub day: NaiveDate,
    pub frequency: Frequency,
    pub from_currency_id: RecordId,
    pub to_currency_id: RecordId,
    /// Units of the target currency per one unit of the base currency
    pub rate: f64,
}

impl ExchangeRate {
    /// Checks required fields before the record is handed to persistence.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(DomainError::Validation(format!(
                "Rate must be positive, got {} for {}",
                self.rate,
                self.natural_key()
            )));
        }
        if self.frequency == Frequency::Monthly && self.day.day() != 1 {
            return Err(DomainError::Validation(format!(
                "Monthly rate must fall on the first of the month, got {}",
                self.day
            )));
        }
        Ok(())
    }
}

impl NaturalKey for ExchangeRate {
    type Key = ExchangeRateKey;

    fn natural_key(&self) -> ExchangeRateKey {
        ExchangeRateKey {
            day: self.day,
            to_currency_id: self.to_currency_id,
        }
    }
}

impl Entity for ExchangeRate {
    const NAME: &'static str = "exchange rates";

    /// Rates are equal when they agree to 4 decimal places.
    fn same_values(&self, other: &Self) -> bool {
        format!("{:.4}", self.rate) == format!("{:.4}", other.rate)
    }
}

/// An exchange rate as published by the source, referring to currencies by code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceExchangeRate {
    pub from_currency: String,
    pub to_currency: String,
    pub frequency: Frequency,
    pub day: NaiveDate,
    pub rate: f64,
}

impl SourceExchangeRate {
    /// Resolves currency codes to store identities.
    pub fn resolve(&self, codes: &HashMap<String, RecordId>) -> Result<ExchangeRate, DomainError> {
        let from_currency_id = *codes
            .get(&self.from_currency)
            .ok_or_else(|| DomainError::UnknownCurrency(self.from_currency.clone()))?;
        let to_currency_id = *codes
            .get(&self.to_currency)
            .ok_or_else(|| DomainError::UnknownCurrency(self.to_currency.clone()))?;

        Ok(ExchangeRate {
            day: self.day,
            frequency: self.frequency,
            from_currency_id,
            to_currency_id,
            rate: self.rate,
        })
    }
}

/// Scope of an exchange rate sync or listing: one base currency, one
/// frequency, an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRateFilter {
    pub base: String,
    pub frequency: Frequency,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ExchangeRateFilter {
    /// Widens `start` to the beginning of its period, so a monthly scope
    /// starting mid-month still covers the observation dated on the 1st.
    pub fn aligned(&self) -> Self {
        Self {
            start: self.frequency.period_start(self.start),
            ..self.clone()
        }
    }
}
