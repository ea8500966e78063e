use time::{Duration, OffsetDateTime};

use sref_service::{Error, Requester, SearchRequest};

use super::ItemSeed;

#[tokio::test]
#[ignore = "Requires external Postgres. Set SREF_PG_DSN to run."]
async fn quiet_items_are_not_trending_even_when_most_popular() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping quiet_items_are_not_trending_even_when_most_popular; set SREF_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(super::test_config(test_db.dsn().to_string())).await;
	let now = OffsetDateTime::now_utc();
	let popular = super::seed_active_item(
		&service,
		ItemSeed { code: "401", title: "Evergreen", popularity_score: 9_999.0, ..Default::default() },
	)
	.await;
	let rising = super::seed_active_item(
		&service,
		ItemSeed { code: "402", title: "Rising", popularity_score: 1.0, ..Default::default() },
	)
	.await;
	let steady = super::seed_active_item(
		&service,
		ItemSeed { code: "403", title: "Steady", popularity_score: 5.0, ..Default::default() },
	)
	.await;

	// Only prior-window activity for the most popular item.
	super::seed_views(&service, popular, now - Duration::hours(30), 10).await;
	super::seed_views(&service, rising, now - Duration::hours(2), 4).await;
	super::seed_views(&service, rising, now - Duration::hours(30), 1).await;
	super::seed_views(&service, steady, now - Duration::hours(3), 2).await;
	super::seed_views(&service, steady, now - Duration::hours(40), 2).await;

	let listing =
		service.trending(&Requester::anonymous(), Some(10)).await.expect("Trending failed.");
	let codes: Vec<&str> = listing.results.iter().map(|item| item.code.as_str()).collect();

	assert_eq!(codes, vec!["402", "403"]);
	assert_eq!(listing.window_hours, 24);

	let rising_trend = listing.results[0].trend.expect("Trending rows carry window counts.");

	assert_eq!(rising_trend.recent_window, 4);
	assert_eq!(rising_trend.prior_window, 1);
	assert!((rising_trend.growth_rate - 3.0).abs() < f64::EPSILON);

	let searched = service
		.search(
			&Requester::anonymous(),
			SearchRequest { sort: Some("trending".to_string()), ..Default::default() },
		)
		.await
		.expect("Search failed.");

	assert_eq!(searched.pagination.total, 2);
	assert!(searched.results.iter().all(|item| item.code != "401"));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SREF_PG_DSN to run."]
async fn trending_storage_failures_surface_a_generic_error() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping trending_storage_failures_surface_a_generic_error; set SREF_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(super::test_config(test_db.dsn().to_string())).await;

	super::seed_active_item(&service, ItemSeed { code: "404", ..Default::default() }).await;
	sqlx::query("DROP TABLE interaction_events CASCADE")
		.execute(&service.db.pool)
		.await
		.expect("Failed to drop interaction_events.");

	let err = service
		.trending(&Requester::anonymous(), Some(10))
		.await
		.expect_err("Trending must fail without interaction_events.");

	assert!(
		matches!(err, Error::Storage { ref message } if message == "Trending is temporarily unavailable."),
		"{err:?}"
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
