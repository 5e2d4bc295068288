//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use refdata_types::{
        Currency, CurrencyRepository, DomainError, EntityWriter, ExchangeRate, ExchangeRateFilter,
        ExchangeRateRepository, Frequency, RecordId, RepoError,
    };

    use crate::sqlite::SqliteRepo;

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    fn daily(d: u32, from: RecordId, to: RecordId, rate: f64) -> ExchangeRate {
        ExchangeRate {
            day: day(d),
            frequency: Frequency::Daily,
            from_currency_id: from,
            to_currency_id: to,
            rate,
        }
    }

    async fn seed_pair(repo: &SqliteRepo) -> (RecordId, RecordId) {
        let eur = repo.insert(&Currency::new("EUR", "Euro")).await.unwrap();
        let usd = repo.insert(&Currency::new("USD", "US dollar")).await.unwrap();
        (eur, usd)
    }

    #[tokio::test]
    async fn test_insert_and_list_currencies() {
        let repo = setup_repo().await;
        let (eur, usd) = seed_pair(&repo).await;

        let currencies = repo.list_currencies().await.unwrap();

        assert_eq!(currencies.len(), 2);
        // ordered by name
        assert_eq!(currencies[0].id, eur);
        assert_eq!(currencies[1].id, usd);
        assert!(currencies[0].created_at.is_some());
        assert!(currencies[0].updated_at.is_none());
    }

    #[tokio::test]
    async fn test_currency_code_map() {
        let repo = setup_repo().await;
        let (eur, usd) = seed_pair(&repo).await;

        let map = repo.currency_code_map().await.unwrap();

        assert_eq!(map["EUR"], eur);
        assert_eq!(map["USD"], usd);
    }

    #[tokio::test]
    async fn test_duplicate_currency_code_conflicts() {
        let repo = setup_repo().await;
        seed_pair(&repo).await;

        let result = repo.insert(&Currency::new("USD", "Dollar")).await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_invalid_currency_rejected() {
        let repo = setup_repo().await;

        let result = repo.insert(&Currency::new("", "Nameless")).await;

        assert!(matches!(
            result,
            Err(RepoError::Domain(DomainError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_update_currency_sets_updated_at() {
        let repo = setup_repo().await;
        let (_, usd) = seed_pair(&repo).await;

        repo.update(usd, &Currency::new("USD", "United States dollar"))
            .await
            .unwrap();

        let fetched = repo.get_currency(usd).await.unwrap().unwrap();
        assert_eq!(fetched.fields.name, "United States dollar");
        assert!(fetched.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_update_missing_currency_is_not_found() {
        let repo = setup_repo().await;

        let result = repo
            .update(RecordId::new(99), &Currency::new("USD", "US dollar"))
            .await;

        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_currency() {
        let repo = setup_repo().await;
        let (_, usd) = seed_pair(&repo).await;

        EntityWriter::<Currency>::delete(&repo, usd).await.unwrap();

        assert!(repo.get_currency(usd).await.unwrap().is_none());
        let again = EntityWriter::<Currency>::delete(&repo, usd).await;
        assert!(matches!(again, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_referenced_currency_conflicts() {
        let repo = setup_repo().await;
        let (eur, usd) = seed_pair(&repo).await;
        repo.insert(&daily(2, eur, usd, 1.1041)).await.unwrap();

        let result = EntityWriter::<Currency>::delete(&repo, usd).await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_bulk_insert_and_list_rates() {
        let repo = setup_repo().await;
        let (eur, usd) = seed_pair(&repo).await;

        let rates: Vec<ExchangeRate> = (1..=30)
            .map(|d| daily(d, eur, usd, 1.10 + f64::from(d) / 1000.0))
            .collect();
        let inserted = repo.bulk_insert(&rates).await.unwrap();
        assert_eq!(inserted, 30);

        let filter = ExchangeRateFilter {
            base: "EUR".into(),
            frequency: Frequency::Daily,
            start: day(5),
            end: day(9),
        };
        let listed = repo.list_exchange_rates(&filter).await.unwrap();

        assert_eq!(listed.len(), 5);
        assert!(listed.iter().all(|r| r.fields.day >= day(5) && r.fields.day <= day(9)));
    }

    #[tokio::test]
    async fn test_bulk_insert_is_atomic() {
        let repo = setup_repo().await;
        let (eur, usd) = seed_pair(&repo).await;

        // same natural key twice
        let rates = vec![daily(2, eur, usd, 1.1), daily(2, eur, usd, 1.2)];
        let result = repo.bulk_insert(&rates).await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
        assert!(repo.daily_series("EUR", "USD", day(1), day(30)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_insert_rejects_non_positive_rate() {
        let repo = setup_repo().await;
        let (eur, usd) = seed_pair(&repo).await;

        let result = repo.bulk_insert(&[daily(2, eur, usd, 0.0)]).await;

        assert!(matches!(result, Err(RepoError::Domain(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete_rate() {
        let repo = setup_repo().await;
        let (eur, usd) = seed_pair(&repo).await;
        let id = repo.insert(&daily(2, eur, usd, 1.10)).await.unwrap();

        repo.update(id, &daily(2, eur, usd, 1.15)).await.unwrap();
        let point = repo.latest_daily_point("EUR", "USD", day(2)).await.unwrap().unwrap();
        assert_eq!(point.rate, 1.15);

        EntityWriter::<ExchangeRate>::delete(&repo, id).await.unwrap();
        assert!(repo.latest_daily_point("EUR", "USD", day(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_daily_point_carries_forward() {
        let repo = setup_repo().await;
        let (eur, usd) = seed_pair(&repo).await;
        repo.bulk_insert(&[daily(5, eur, usd, 1.1050), daily(6, eur, usd, 1.1100)])
            .await
            .unwrap();

        // Saturday resolves to Friday
        let point = repo.latest_daily_point("EUR", "USD", day(7)).await.unwrap().unwrap();
        assert_eq!(point.day, day(6));
        assert_eq!(point.rate, 1.1100);

        assert!(repo.latest_daily_point("EUR", "USD", day(4)).await.unwrap().is_none());
        assert!(repo.latest_daily_point("USD", "EUR", day(7)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_daily_point_ignores_monthly() {
        let repo = setup_repo().await;
        let (eur, usd) = seed_pair(&repo).await;
        let monthly = ExchangeRate {
            day: day(1),
            frequency: Frequency::Monthly,
            from_currency_id: eur,
            to_currency_id: usd,
            rate: 1.1,
        };
        repo.insert(&monthly).await.unwrap();

        assert!(repo.latest_daily_point("EUR", "USD", day(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_daily_series_is_descending_and_bounded() {
        let repo = setup_repo().await;
        let (eur, usd) = seed_pair(&repo).await;
        repo.bulk_insert(&[
            daily(2, eur, usd, 1.1041),
            daily(4, eur, usd, 1.1037),
            daily(3, eur, usd, 1.1030),
            daily(9, eur, usd, 1.1050),
        ])
        .await
        .unwrap();

        let series = repo.daily_series("EUR", "USD", day(2), day(5)).await.unwrap();

        let days: Vec<NaiveDate> = series.iter().map(|p| p.day).collect();
        assert_eq!(days, vec![day(4), day(3), day(2)]);
    }

    #[tokio::test]
    async fn test_build_repo_picks_sqlite() {
        let repo = crate::build_repo("sqlite::memory:").await.unwrap();

        let id = repo.insert(&Currency::new("EUR", "Euro")).await.unwrap();

        assert_eq!(repo.get_currency(id).await.unwrap().unwrap().fields.code, "EUR");
    }

    #[tokio::test]
    async fn test_build_repo_rejects_unknown_scheme() {
        assert!(crate::build_repo("mysql://localhost/refdata").await.is_err());
    }

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("refdata.db");
        let url = format!("sqlite://{}?mode=rwc", path.display());

        {
            let repo = SqliteRepo::new(&url).await.unwrap();
            seed_pair(&repo).await;
            repo.pool().close().await;
        }

        let reopened = SqliteRepo::new(&url).await.unwrap();
        assert_eq!(reopened.list_currencies().await.unwrap().len(), 2);
    }
}
