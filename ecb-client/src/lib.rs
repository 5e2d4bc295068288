//! # ECB Client
//!
//! Client for the European Central Bank data API (`EXR` dataflow).
//! Implements the `ReferenceSource` port: currencies quoted against a base
//! currency, and daily or monthly reference rates over a date range.
//!
//! Docs: <https://data.ecb.europa.eu/help/api/data>

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use refdata_types::{
    Currency, ExchangeRateFilter, Frequency, ReferenceSource, SourceError, SourceExchangeRate,
};

/// Public endpoint of the ECB data API.
pub const DEFAULT_BASE_URL: &str = "https://data-api.ecb.europa.eu";

/// Request timeout applied to every call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Client configuration.
#[derive(Debug, Clone)]
pub struct EcbConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for EcbConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// ECB data API client.
pub struct EcbClient {
    base_url: String,
    http: Client,
}

impl EcbClient {
    /// Creates a new client.
    pub fn new(config: EcbConfig) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Fetches average rates from `filter.base` to every other published
    /// currency within `[filter.start, filter.end]`.
    #[tracing::instrument(skip(self, filter), fields(base = %filter.base, frequency = %filter.frequency))]
    pub async fn fetch_exchange_rates(
        &self,
        filter: &ExchangeRateFilter,
    ) -> Result<Vec<SourceExchangeRate>, SourceError> {
        validate_range(filter.start, filter.end, Utc::now().date_naive())?;

        let url = format!(
            "{}/service/data/EXR/{}..{}.SP00.A",
            self.base_url,
            filter.frequency.code(),
            filter.base
        );
        let query = [
            ("detail", "dataonly".to_string()),
            ("format", "csvdata".to_string()),
            ("startPeriod", filter.frequency.format_period(filter.start)),
            ("endPeriod", filter.frequency.format_period(filter.end)),
        ];

        let body = self.get_csv(&url, &query).await?;
        let rates = parse_exchange_rates(&body, &filter.base, filter.frequency)?;

        tracing::debug!(count = rates.len(), "fetched exchange rates");
        Ok(rates)
    }

    /// Fetches every currency with a daily reference rate against `base`,
    /// plus `base` itself.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_currencies(&self, base: &str) -> Result<Vec<Currency>, SourceError> {
        let url = format!(
            "{}/service/data/EXR/{}..{}.SP00.A",
            self.base_url,
            Frequency::Daily.code(),
            base
        );
        let query = [
            ("lastNObservations", "1".to_string()),
            ("detail", "full".to_string()),
            ("format", "csvdata".to_string()),
        ];

        let body = self.get_csv(&url, &query).await?;
        let currencies = parse_currencies(&body, base)?;

        tracing::debug!(count = currencies.len(), "fetched currencies");
        Ok(currencies)
    }

    async fn get_csv(&self, url: &str, query: &[(&str, String)]) -> Result<String, SourceError> {
        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        // The API answers 404 when the series has no observations in range
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NoData("no rates found for these params".into()));
        }
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl ReferenceSource for EcbClient {
    async fn fetch_currencies(&self, base: &str) -> Result<Vec<Currency>, SourceError> {
        EcbClient::fetch_currencies(self, base).await
    }

    async fn fetch_exchange_rates(
        &self,
        filter: &ExchangeRateFilter,
    ) -> Result<Vec<SourceExchangeRate>, SourceError> {
        EcbClient::fetch_exchange_rates(self, filter).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request validation
// ─────────────────────────────────────────────────────────────────────────────

/// Rejects ranges that start after they end or reach into the future.
pub fn validate_range(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<(), SourceError> {
    if start > today {
        return Err(SourceError::InvalidRequest(format!(
            "start {start} must not be after today"
        )));
    }
    if start > end {
        return Err(SourceError::InvalidRequest(format!(
            "start {start} must not be after end {end}"
        )));
    }
    if end > today {
        return Err(SourceError::InvalidRequest(format!(
            "end {end} must not be after today"
        )));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// CSV payloads
// ─────────────────────────────────────────────────────────────────────────────

/// One observation of `detail=dataonly` output.
///
/// ```text
/// KEY,FREQ,CURRENCY,CURRENCY_DENOM,EXR_TYPE,EXR_SUFFIX,TIME_PERIOD,OBS_VALUE
/// EXR.D.AUD.EUR.SP00.A,D,AUD,EUR,SP00,A,2024-09-02,1.6322
/// ```
#[derive(Debug, Deserialize)]
struct ObservationRow {
    #[serde(rename = "CURRENCY")]
    currency: String,
    #[serde(rename = "TIME_PERIOD")]
    time_period: String,
    #[serde(rename = "OBS_VALUE")]
    obs_value: String,
}

/// Series attributes of `detail=full` output; only the title is used.
#[derive(Debug, Deserialize)]
struct SeriesRow {
    #[serde(rename = "CURRENCY")]
    currency: String,
    #[serde(rename = "TITLE")]
    title: String,
}

fn read_rows<T: for<'de> Deserialize<'de>>(body: &str) -> Result<Vec<T>, SourceError> {
    csv::Reader::from_reader(body.as_bytes())
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| SourceError::Parse(e.to_string()))
}

/// Parses rate observations, mapping monthly periods to the first of the month.
pub fn parse_exchange_rates(
    body: &str,
    base: &str,
    frequency: Frequency,
) -> Result<Vec<SourceExchangeRate>, SourceError> {
    let rows: Vec<ObservationRow> = read_rows(body)?;
    if rows.is_empty() {
        return Err(SourceError::NoData("no rates found for these params".into()));
    }

    rows.into_iter()
        .map(|row| {
            let day = frequency
                .parse_period(&row.time_period)
                .map_err(|e| SourceError::Parse(e.to_string()))?;
            let rate: f64 = row.obs_value.trim().parse().map_err(|_| {
                SourceError::Parse(format!(
                    "invalid rate '{}' for {} on {}",
                    row.obs_value, row.currency, row.time_period
                ))
            })?;

            Ok(SourceExchangeRate {
                from_currency: base.to_string(),
                to_currency: row.currency,
                frequency,
                day,
                rate,
            })
        })
        .collect()
}

/// Parses series titles such as `US dollar/Euro` into currencies.
///
/// The left side names the quoted currency, the right side names `base`.
pub fn parse_currencies(body: &str, base: &str) -> Result<Vec<Currency>, SourceError> {
    let rows: Vec<SeriesRow> = read_rows(body)?;

    let mut base_name = None;
    let mut currencies = Vec::with_capacity(rows.len() + 1);
    for row in rows {
        let (name, denom) = row.title.rsplit_once('/').ok_or_else(|| {
            SourceError::Parse(format!(
                "unexpected series title '{}' for {}",
                row.title, row.currency
            ))
        })?;
        base_name.get_or_insert_with(|| denom.trim().to_string());
        currencies.push(Currency::new(row.currency, name.trim()));
    }

    let base_name =
        base_name.ok_or_else(|| SourceError::NoData(format!("no currencies quoted against {base}")))?;
    currencies.push(Currency::new(base, base_name));

    Ok(currencies)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const DAILY_CSV: &str = "\
KEY,FREQ,CURRENCY,CURRENCY_DENOM,EXR_TYPE,EXR_SUFFIX,TIME_PERIOD,OBS_VALUE
EXR.D.AUD.EUR.SP00.A,D,AUD,EUR,SP00,A,2024-09-02,1.6322
EXR.D.AUD.EUR.SP00.A,D,AUD,EUR,SP00,A,2024-09-03,1.6394
EXR.D.USD.EUR.SP00.A,D,USD,EUR,SP00,A,2024-09-02,1.1061
";

    #[test]
    fn test_parse_daily_rates() {
        let rates = parse_exchange_rates(DAILY_CSV, "EUR", Frequency::Daily).unwrap();

        assert_eq!(rates.len(), 3);
        assert_eq!(rates[0].from_currency, "EUR");
        assert_eq!(rates[0].to_currency, "AUD");
        assert_eq!(rates[0].day, d(2024, 9, 2));
        assert_eq!(rates[0].rate, 1.6322);
        assert_eq!(rates[2].to_currency, "USD");
    }

    #[test]
    fn test_parse_monthly_rates_use_first_of_month() {
        let csv = "\
KEY,FREQ,CURRENCY,CURRENCY_DENOM,EXR_TYPE,EXR_SUFFIX,TIME_PERIOD,OBS_VALUE
EXR.M.USD.EUR.SP00.A,M,USD,EUR,SP00,A,2024-08,1.1012
";
        let rates = parse_exchange_rates(csv, "EUR", Frequency::Monthly).unwrap();

        assert_eq!(rates[0].day, d(2024, 8, 1));
        assert_eq!(rates[0].frequency, Frequency::Monthly);
    }

    #[test]
    fn test_header_only_is_no_data() {
        let csv = "KEY,FREQ,CURRENCY,CURRENCY_DENOM,EXR_TYPE,EXR_SUFFIX,TIME_PERIOD,OBS_VALUE\n";

        let result = parse_exchange_rates(csv, "EUR", Frequency::Daily);

        assert!(matches!(result, Err(SourceError::NoData(_))));
    }

    #[test]
    fn test_unparsable_rate_is_parse_error() {
        let csv = "\
KEY,FREQ,CURRENCY,CURRENCY_DENOM,EXR_TYPE,EXR_SUFFIX,TIME_PERIOD,OBS_VALUE
EXR.D.USD.EUR.SP00.A,D,USD,EUR,SP00,A,2024-09-02,NaN?
";
        let result = parse_exchange_rates(csv, "EUR", Frequency::Daily);

        assert!(matches!(result, Err(SourceError::Parse(_))));
    }

    #[test]
    fn test_unparsable_period_is_parse_error() {
        let csv = "\
KEY,FREQ,CURRENCY,CURRENCY_DENOM,EXR_TYPE,EXR_SUFFIX,TIME_PERIOD,OBS_VALUE
EXR.D.USD.EUR.SP00.A,D,USD,EUR,SP00,A,2024-09,1.1061
";
        let result = parse_exchange_rates(csv, "EUR", Frequency::Daily);

        assert!(matches!(result, Err(SourceError::Parse(_))));
    }

    #[test]
    fn test_parse_currencies_from_titles() {
        let csv = "\
KEY,FREQ,CURRENCY,CURRENCY_DENOM,EXR_TYPE,EXR_SUFFIX,TIME_PERIOD,OBS_VALUE,TITLE,UNIT
EXR.D.USD.EUR.SP00.A,D,USD,EUR,SP00,A,2024-09-06,1.1104,US dollar/Euro,USD
EXR.D.JPY.EUR.SP00.A,D,JPY,EUR,SP00,A,2024-09-06,158.4,Japanese yen/Euro,JPY
";
        let currencies = parse_currencies(csv, "EUR").unwrap();

        assert_eq!(
            currencies,
            vec![
                Currency::new("USD", "US dollar"),
                Currency::new("JPY", "Japanese yen"),
                Currency::new("EUR", "Euro"),
            ]
        );
    }

    #[test]
    fn test_parse_currencies_rejects_untitled_series() {
        let csv = "CURRENCY,TITLE\nUSD,US dollar\n";

        let result = parse_currencies(csv, "EUR");

        assert!(matches!(result, Err(SourceError::Parse(_))));
    }

    #[test]
    fn test_validate_range() {
        let today = d(2024, 9, 10);

        assert!(validate_range(d(2024, 9, 2), d(2024, 9, 6), today).is_ok());
        assert!(validate_range(d(2024, 9, 10), d(2024, 9, 10), today).is_ok());
        assert!(matches!(
            validate_range(d(2024, 9, 11), d(2024, 9, 12), today),
            Err(SourceError::InvalidRequest(_))
        ));
        assert!(matches!(
            validate_range(d(2024, 9, 6), d(2024, 9, 2), today),
            Err(SourceError::InvalidRequest(_))
        ));
        assert!(matches!(
            validate_range(d(2024, 9, 2), d(2024, 9, 11), today),
            Err(SourceError::InvalidRequest(_))
        ));
    }
}
