//! Shared database row types for SQLite and PostgreSQL.
//!
//! Dates and timestamps go through sqlx's chrono support on both backends
//! (`DATE`/`TIMESTAMPTZ` on Postgres, ISO-8601 `TEXT` on SQLite).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use refdata_types::{
    Currency, ExchangeRate, Frequency, Persisted, RatePoint, RecordId, RepoError,
};

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Currency row from database.
#[derive(FromRow)]
pub struct DbCurrency {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DbCurrency {
    pub fn into_domain(self) -> Persisted<Currency> {
        Persisted::from_parts(
            RecordId::new(self.id),
            Currency::new(self.code, self.name),
            self.created_at,
            self.updated_at,
        )
    }
}

/// Exchange rate row from database.
#[derive(FromRow)]
pub struct DbExchangeRate {
    pub id: i64,
    pub day: NaiveDate,
    pub frequency: String,
    pub from_currency_id: i64,
    pub to_currency_id: i64,
    pub rate: f64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DbExchangeRate {
    pub fn into_domain(self) -> Result<Persisted<ExchangeRate>, RepoError> {
        let frequency: Frequency = self.frequency.parse().map_err(RepoError::Database)?;

        Ok(Persisted::from_parts(
            RecordId::new(self.id),
            ExchangeRate {
                day: self.day,
                frequency,
                from_currency_id: RecordId::new(self.from_currency_id),
                to_currency_id: RecordId::new(self.to_currency_id),
                rate: self.rate,
            },
            self.created_at,
            self.updated_at,
        ))
    }
}

/// Day/rate row for series queries.
#[derive(FromRow)]
pub struct DbRatePoint {
    pub day: NaiveDate,
    pub rate: f64,
}

impl From<DbRatePoint> for RatePoint {
    fn from(row: DbRatePoint) -> Self {
        RatePoint::new(row.day, row.rate)
    }
}

/// Maps driver errors, turning constraint violations into conflicts.
pub fn db_error(err: sqlx::Error) -> RepoError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
            return RepoError::Conflict(db_err.message().to_string());
        }
    }
    RepoError::Database(err.to_string())
}
