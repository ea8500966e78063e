use std::collections::BTreeMap;

use time::{Duration, OffsetDateTime};

use sref_domain::pagination::Pagination;
use sref_service::{Error, RangeBounds, Requester, SearchFilters, SearchRequest};

use super::ItemSeed;

#[tokio::test]
#[ignore = "Requires external Postgres. Set SREF_PG_DSN to run."]
async fn newest_sort_pages_only_matching_items() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping newest_sort_pages_only_matching_items; set SREF_PG_DSN to run this test.");

		return;
	};
	let service = super::build_service(super::test_config(test_db.dsn().to_string())).await;
	let t1 = OffsetDateTime::now_utc() - Duration::days(3);

	for (code, title, created_at) in [
		("101", "Something else", t1),
		("102", "Anime B", t1 + Duration::days(1)),
		("103", "Anime A", t1 + Duration::days(2)),
	] {
		super::seed_active_item(&service, ItemSeed { code, title, created_at, ..Default::default() })
			.await;
	}

	let response = service
		.search(
			&Requester::anonymous(),
			SearchRequest {
				query: "anime".to_string(),
				sort: Some("newest".to_string()),
				page: Some(1),
				limit: Some(2),
				..Default::default()
			},
		)
		.await
		.expect("Search failed.");
	let titles: Vec<&str> = response.results.iter().map(|item| item.title.as_str()).collect();

	assert_eq!(titles, vec!["Anime A", "Anime B"]);
	assert_eq!(
		response.pagination,
		Pagination {
			page: 1,
			limit: 2,
			total: 2,
			total_pages: 1,
			has_next: false,
			has_prev: false
		}
	);
	assert!(response.facets.is_none());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SREF_PG_DSN to run."]
async fn premium_facet_splits_the_total() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping premium_facet_splits_the_total; set SREF_PG_DSN to run this test.");

		return;
	};
	let service = super::build_service(super::test_config(test_db.dsn().to_string())).await;
	let premium_user = super::seed_user(&service, "USER", true).await;
	let anime = super::seed_category(&service, "anime").await;
	let portrait = super::seed_category(&service, "portrait").await;

	super::seed_active_item(
		&service,
		ItemSeed { code: "201", title: "Neon", categories: &[anime], tags: &["neon"], ..Default::default() },
	)
	.await;
	super::seed_active_item(
		&service,
		ItemSeed {
			code: "202",
			title: "Ink",
			premium: true,
			categories: &[anime, portrait],
			tags: &["ink", "neon"],
			..Default::default()
		},
	)
	.await;
	super::seed_active_item(
		&service,
		ItemSeed { code: "203", title: "Clay", categories: &[portrait], ..Default::default() },
	)
	.await;

	let response = service
		.search(&Requester::user(premium_user), SearchRequest { facets: true, ..Default::default() })
		.await
		.expect("Search failed.");
	let facets = response.facets.expect("Facets were requested.");

	assert_eq!(response.pagination.total, 3);
	assert_eq!(facets.premium_split.free + facets.premium_split.premium, 3);
	assert_eq!(facets.premium_split.premium, 1);

	let anime_bucket = facets
		.categories
		.iter()
		.find(|bucket| bucket.slug == "anime")
		.expect("anime bucket is present.");

	assert_eq!(anime_bucket.count, 2);
	assert_eq!(facets.tags.first().map(|tag| (tag.name.as_str(), tag.count)), Some(("neon", 2)));

	let narrowed = service
		.search(
			&Requester::user(premium_user),
			SearchRequest {
				facets: true,
				filters: SearchFilters {
					categories: Some(vec!["portrait".to_string()]),
					..Default::default()
				},
				..Default::default()
			},
		)
		.await
		.expect("Search failed.");
	let narrowed_facets = narrowed.facets.expect("Facets were requested.");

	assert_eq!(narrowed.pagination.total, 2);
	assert_eq!(narrowed_facets.premium_split.total(), 2);
	// The category facet ignores the category filter so siblings stay visible.
	assert!(narrowed_facets.categories.iter().any(|bucket| bucket.slug == "anime"));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SREF_PG_DSN to run."]
async fn numeric_range_and_validation_errors() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping numeric_range_and_validation_errors; set SREF_PG_DSN to run this test.");

		return;
	};
	let service = super::build_service(super::test_config(test_db.dsn().to_string())).await;

	for (code, views) in [("301", 5), ("302", 50), ("303", 500)] {
		super::seed_active_item(&service, ItemSeed { code, title: "Range", views, ..Default::default() })
			.await;
	}

	let ranges = BTreeMap::from([(
		"views".to_string(),
		RangeBounds { min: Some(10.0), max: Some(100.0) },
	)]);
	let response = service
		.search(
			&Requester::anonymous(),
			SearchRequest {
				filters: SearchFilters { numeric_ranges: Some(ranges), ..Default::default() },
				..Default::default()
			},
		)
		.await
		.expect("Search failed.");

	assert_eq!(response.results.len(), 1);
	assert_eq!(response.results[0].code, "302");

	let err = service
		.search(&Requester::anonymous(), SearchRequest { limit: Some(101), ..Default::default() })
		.await
		.expect_err("Oversized limit must be rejected.");

	assert!(matches!(err, Error::InvalidRequest { ref field, .. } if field == "$.limit"), "{err:?}");

	let inverted = BTreeMap::from([(
		"likes".to_string(),
		RangeBounds { min: Some(9.0), max: Some(1.0) },
	)]);
	let err = service
		.search(
			&Requester::anonymous(),
			SearchRequest {
				filters: SearchFilters { numeric_ranges: Some(inverted), ..Default::default() },
				..Default::default()
			},
		)
		.await
		.expect_err("Inverted range must be rejected.");

	assert!(
		matches!(err, Error::InvalidRequest { ref field, .. } if field == "$.filters.numericRanges.likes"),
		"{err:?}"
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SREF_PG_DSN to run."]
async fn apostrophe_queries_match_the_stored_words() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping apostrophe_queries_match_the_stored_words; set SREF_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(super::test_config(test_db.dsn().to_string())).await;

	super::seed_active_item(
		&service,
		ItemSeed { code: "501", title: "Anime's world", ..Default::default() },
	)
	.await;
	super::seed_active_item(&service, ItemSeed { code: "502", title: "Clay", ..Default::default() })
		.await;

	for query in ["Anime's", "anime", "anime's wor"] {
		let response = service
			.search(
				&Requester::anonymous(),
				SearchRequest { query: query.to_string(), ..Default::default() },
			)
			.await
			.expect("Search failed.");
		let codes: Vec<&str> = response.results.iter().map(|item| item.code.as_str()).collect();

		assert_eq!(codes, vec!["501"], "query {query:?}");
	}

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SREF_PG_DSN to run."]
async fn category_and_tag_filters_combine() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping category_and_tag_filters_combine; set SREF_PG_DSN to run this test.");

		return;
	};
	let service = super::build_service(super::test_config(test_db.dsn().to_string())).await;
	let x = super::seed_category(&service, "x").await;
	let y = super::seed_category(&service, "y").await;

	super::seed_active_item(
		&service,
		ItemSeed { code: "601", title: "A", categories: &[x], tags: &["p"], ..Default::default() },
	)
	.await;
	super::seed_active_item(
		&service,
		ItemSeed { code: "602", title: "B", categories: &[y], tags: &["p"], ..Default::default() },
	)
	.await;
	super::seed_active_item(
		&service,
		ItemSeed { code: "603", title: "C", categories: &[x], tags: &["q"], ..Default::default() },
	)
	.await;

	let cases: [(&[&str], &[&str], &[&str]); 4] = [
		(&["x"], &["p"], &["601"]),
		(&["x", "y"], &["p"], &["601", "602"]),
		(&["x"], &["p", "q"], &["601", "603"]),
		// Tags are stored lowercase, so filter values are folded too.
		(&["x", "y"], &["P"], &["601", "602"]),
	];

	for (categories, tags, expected) in cases {
		let response = service
			.search(
				&Requester::anonymous(),
				SearchRequest {
					filters: SearchFilters {
						categories: Some(categories.iter().map(|slug| slug.to_string()).collect()),
						tags: Some(tags.iter().map(|tag| tag.to_string()).collect()),
						..Default::default()
					},
					..Default::default()
				},
			)
			.await
			.expect("Search failed.");
		let mut codes: Vec<&str> =
			response.results.iter().map(|item| item.code.as_str()).collect();

		codes.sort_unstable();

		assert_eq!(codes, expected, "categories {categories:?} tags {tags:?}");
	}

	let err = service
		.search(
			&Requester::anonymous(),
			SearchRequest {
				filters: SearchFilters {
					categories: Some(vec![" ".to_string()]),
					..Default::default()
				},
				..Default::default()
			},
		)
		.await
		.expect_err("Blank category must be rejected.");

	assert!(
		matches!(err, Error::InvalidRequest { ref field, .. } if field == "$.filters.categories"),
		"{err:?}"
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
