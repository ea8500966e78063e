use std::time::Duration;

use sref_service::{Requester, SearchRequest};

use super::ItemSeed;

#[tokio::test]
#[ignore = "Requires external Postgres. Set SREF_PG_DSN to run."]
async fn repeated_search_is_served_from_cache() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping repeated_search_is_served_from_cache; set SREF_PG_DSN to run this test.");

		return;
	};
	let mut cfg = super::test_config(test_db.dsn().to_string());

	cfg.search.cache.enabled = true;

	let service = super::build_service(cfg).await;

	super::seed_active_item(&service, ItemSeed { code: "601", title: "Cached", ..Default::default() })
		.await;

	let request = SearchRequest { query: "cached".to_string(), ..Default::default() };
	let first =
		service.search(&Requester::anonymous(), request.clone()).await.expect("Search failed.");

	assert_eq!(first.pagination.total, 1);

	// A cache hit must not read the catalog, so the removed row is still returned.
	sqlx::query("DELETE FROM catalog_items WHERE code = '601'")
		.execute(&service.db.pool)
		.await
		.expect("Failed to delete item.");

	let second = service.search(&Requester::anonymous(), request).await.expect("Search failed.");

	assert_eq!(second.results.len(), 1);
	assert_eq!(second.results[0].code, "601");

	let hits: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(hit_count), 0)::bigint FROM search_cache")
		.fetch_one(&service.db.pool)
		.await
		.expect("Failed to read cache hits.");

	assert_eq!(hits, 1);

	// Analytics rows are written by detached tasks.
	let mut recorded = (0_i64, 0_i64);

	for _ in 0..50 {
		recorded = sqlx::query_as(
			"SELECT count(*), count(*) FILTER (WHERE cache_hit) FROM search_analytics",
		)
		.fetch_one(&service.db.pool)
		.await
		.expect("Failed to read analytics.");

		if recorded.0 == 2 {
			break;
		}

		tokio::time::sleep(Duration::from_millis(100)).await;
	}

	assert_eq!(recorded, (2, 1));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
