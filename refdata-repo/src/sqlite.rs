//! SQLite repository adapter.
#![allow(clippy::collapsible_if)]

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use refdata_types::{
    Currency, CurrencyRepository, EntityWriter, ExchangeRate, ExchangeRateFilter,
    ExchangeRateRepository, Frequency, Persisted, RatePoint, RecordId, RepoError,
};

use crate::types::{DbCurrency, DbExchangeRate, DbRatePoint, db_error};

/// Rows per INSERT statement; six binds per row stays under SQLite's variable limit.
const BULK_CHUNK_ROWS: usize = 100;

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

const MIGRATIONS: [(&str, &str); 2] = [
    ("0001", include_str!("../migrations/0001_create_currencies.sql")),
    ("0002", include_str!("../migrations/0002_create_exchange_rates.sql")),
];

async fn run_migrations(pool: &SqlitePool) -> Result<(), anyhow::Error> {
    for (name, sql) in MIGRATIONS {
        for statement in sql.split(';') {
            let stmt = statement.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt)
                    .execute(pool)
                    .await
                    .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
            }
        }
    }
    Ok(())
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:");

        // Ensure on-disk SQLite target directory exists.
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if !in_memory {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // An in-memory database lives only as long as its connection.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };
        let pool = pool_options.connect_with(options).await?;

        run_migrations(&pool).await?;
        tracing::debug!(database_url, "sqlite repository ready");

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database schema (for testing with existing pool).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        run_migrations(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Currencies
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl EntityWriter<Currency> for SqliteRepo {
    async fn insert(&self, record: &Currency) -> Result<RecordId, RepoError> {
        record.validate()?;

        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO currencies (code, name, created_at) VALUES (?, ?, ?) RETURNING id"#,
        )
        .bind(&record.code)
        .bind(&record.name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(RecordId::new(id))
    }

    async fn update(&self, id: RecordId, record: &Currency) -> Result<(), RepoError> {
        record.validate()?;

        let result =
            sqlx::query(r#"UPDATE currencies SET code = ?, name = ?, updated_at = ? WHERE id = ?"#)
                .bind(&record.code)
                .bind(&record.name)
                .bind(Utc::now())
                .bind(id.get())
                .execute(&self.pool)
                .await
                .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: RecordId) -> Result<(), RepoError> {
        let result = sqlx::query(r#"DELETE FROM currencies WHERE id = ?"#)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CurrencyRepository for SqliteRepo {
    async fn list_currencies(&self) -> Result<Vec<Persisted<Currency>>, RepoError> {
        let rows: Vec<DbCurrency> = sqlx::query_as(
            r#"SELECT id, code, name, created_at, updated_at FROM currencies ORDER BY name"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(DbCurrency::into_domain).collect())
    }

    async fn get_currency(&self, id: RecordId) -> Result<Option<Persisted<Currency>>, RepoError> {
        let row: Option<DbCurrency> = sqlx::query_as(
            r#"SELECT id, code, name, created_at, updated_at FROM currencies WHERE id = ?"#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(DbCurrency::into_domain))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exchange rates
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl EntityWriter<ExchangeRate> for SqliteRepo {
    async fn insert(&self, record: &ExchangeRate) -> Result<RecordId, RepoError> {
        record.validate()?;

        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO exchange_rates (day, frequency, from_currency_id, to_currency_id, rate, created_at)
               VALUES (?, ?, ?, ?, ?, ?) RETURNING id"#,
        )
        .bind(record.day)
        .bind(record.frequency.code())
        .bind(record.from_currency_id.get())
        .bind(record.to_currency_id.get())
        .bind(record.rate)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(RecordId::new(id))
    }

    async fn bulk_insert(&self, records: &[ExchangeRate]) -> Result<u64, RepoError> {
        for record in records {
            record.validate()?;
        }

        let now = Utc::now();
        let mut db_tx = self.pool.begin().await.map_err(db_error)?;
        let mut inserted = 0;

        for chunk in records.chunks(BULK_CHUNK_ROWS) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO exchange_rates (day, frequency, from_currency_id, to_currency_id, rate, created_at) ",
            );
            builder.push_values(chunk, |mut row, record| {
                row.push_bind(record.day)
                    .push_bind(record.frequency.code())
                    .push_bind(record.from_currency_id.get())
                    .push_bind(record.to_currency_id.get())
                    .push_bind(record.rate)
                    .push_bind(now);
            });

            let result = builder
                .build()
                .execute(&mut *db_tx)
                .await
                .map_err(db_error)?;
            inserted += result.rows_affected();
        }

        db_tx.commit().await.map_err(db_error)?;
        Ok(inserted)
    }

    async fn update(&self, id: RecordId, record: &ExchangeRate) -> Result<(), RepoError> {
        record.validate()?;

        let result = sqlx::query(
            r#"UPDATE exchange_rates
               SET day = ?, frequency = ?, from_currency_id = ?, to_currency_id = ?, rate = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(record.day)
        .bind(record.frequency.code())
        .bind(record.from_currency_id.get())
        .bind(record.to_currency_id.get())
        .bind(record.rate)
        .bind(Utc::now())
        .bind(id.get())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: RecordId) -> Result<(), RepoError> {
        let result = sqlx::query(r#"DELETE FROM exchange_rates WHERE id = ?"#)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl ExchangeRateRepository for SqliteRepo {
    async fn list_exchange_rates(
        &self,
        filter: &ExchangeRateFilter,
    ) -> Result<Vec<Persisted<ExchangeRate>>, RepoError> {
        let rows: Vec<DbExchangeRate> = sqlx::query_as(
            r#"SELECT r.id, r.day, r.frequency, r.from_currency_id, r.to_currency_id, r.rate, r.created_at, r.updated_at
               FROM exchange_rates r
               JOIN currencies f ON f.id = r.from_currency_id
               WHERE f.code = ? AND r.frequency = ? AND r.day >= ? AND r.day <= ?
               ORDER BY r.id"#,
        )
        .bind(&filter.base)
        .bind(filter.frequency.code())
        .bind(filter.start)
        .bind(filter.end)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(DbExchangeRate::into_domain).collect()
    }

    async fn latest_daily_point(
        &self,
        from: &str,
        to: &str,
        day: NaiveDate,
    ) -> Result<Option<RatePoint>, RepoError> {
        let row: Option<DbRatePoint> = sqlx::query_as(
            r#"SELECT r.day, r.rate
               FROM exchange_rates r
               JOIN currencies f ON f.id = r.from_currency_id
               JOIN currencies t ON t.id = r.to_currency_id
               WHERE r.frequency = ? AND f.code = ? AND t.code = ? AND r.day <= ?
               ORDER BY r.day DESC
               LIMIT 1"#,
        )
        .bind(Frequency::Daily.code())
        .bind(from)
        .bind(to)
        .bind(day)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(RatePoint::from))
    }

    async fn daily_series(
        &self,
        from: &str,
        to: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RatePoint>, RepoError> {
        let rows: Vec<DbRatePoint> = sqlx::query_as(
            r#"SELECT r.day, r.rate
               FROM exchange_rates r
               JOIN currencies f ON f.id = r.from_currency_id
               JOIN currencies t ON t.id = r.to_currency_id
               WHERE r.frequency = ? AND f.code = ? AND t.code = ? AND r.day >= ? AND r.day <= ?
               ORDER BY r.day DESC"#,
        )
        .bind(Frequency::Daily.code())
        .bind(from)
        .bind(to)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(RatePoint::from).collect())
    }
}
