//! PostgreSQL repository adapter.
#![allow(clippy::collapsible_if)]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use refdata_types::{
    Currency, CurrencyRepository, EntityWriter, ExchangeRate, ExchangeRateFilter,
    ExchangeRateRepository, Frequency, Persisted, RatePoint, RecordId, RepoError,
};

use crate::types::{DbCurrency, DbExchangeRate, DbRatePoint, db_error};

/// Rows per INSERT statement; keeps bind parameters well under the 65535 limit.
const BULK_CHUNK_ROWS: usize = 1000;

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_currencies_pg.sql"),
        "0001",
    )
    .await?;

    execute_migration(
        pool,
        include_str!("../migrations/0002_create_exchange_rates_pg.sql"),
        "0002",
    )
    .await?;

    Ok(())
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
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
impl EntityWriter<Currency> for PostgresRepo {
    async fn insert(&self, record: &Currency) -> Result<RecordId, RepoError> {
        record.validate()?;

        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO currencies (code, name, created_at) VALUES ($1, $2, $3) RETURNING id"#,
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

        let result = sqlx::query(
            r#"UPDATE currencies SET code = $1, name = $2, updated_at = $3 WHERE id = $4"#,
        )
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
        let result = sqlx::query(r#"DELETE FROM currencies WHERE id = $1"#)
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
impl CurrencyRepository for PostgresRepo {
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
            r#"SELECT id, code, name, created_at, updated_at FROM currencies WHERE id = $1"#,
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
impl EntityWriter<ExchangeRate> for PostgresRepo {
    async fn insert(&self, record: &ExchangeRate) -> Result<RecordId, RepoError> {
        record.validate()?;

        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO exchange_rates (day, frequency, from_currency_id, to_currency_id, rate, created_at)
               VALUES ($1, $2, $3, $4, $5, $6) RETURNING id"#,
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
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
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
               SET day = $1, frequency = $2, from_currency_id = $3, to_currency_id = $4, rate = $5, updated_at = $6
               WHERE id = $7"#,
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
        let result = sqlx::query(r#"DELETE FROM exchange_rates WHERE id = $1"#)
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
impl ExchangeRateRepository for PostgresRepo {
    async fn list_exchange_rates(
        &self,
        filter: &ExchangeRateFilter,
    ) -> Result<Vec<Persisted<ExchangeRate>>, RepoError> {
        let rows: Vec<DbExchangeRate> = sqlx::query_as(
            r#"SELECT r.id, r.day, r.frequency, r.from_currency_id, r.to_currency_id, r.rate, r.created_at, r.updated_at
               FROM exchange_rates r
               JOIN currencies f ON f.id = r.from_currency_id
               WHERE f.code = $1 AND r.frequency = $2 AND r.day >= $3 AND r.day <= $4
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
               WHERE r.frequency = $1 AND f.code = $2 AND t.code = $3 AND r.day <= $4
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
               WHERE r.frequency = $1 AND f.code = $2 AND t.code = $3 AND r.day >= $4 AND r.day <= $5
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
