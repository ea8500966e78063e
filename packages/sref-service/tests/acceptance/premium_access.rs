use uuid::Uuid;

use sref_service::{Error, Requester, SearchFilters, SearchRequest};

use super::ItemSeed;

fn premium_only() -> SearchRequest {
	SearchRequest {
		filters: SearchFilters { premium: Some(true), ..Default::default() },
		..Default::default()
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SREF_PG_DSN to run."]
async fn premium_items_follow_the_callers_access_level() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping premium_items_follow_the_callers_access_level; set SREF_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(super::test_config(test_db.dsn().to_string())).await;
	let member = super::seed_user(&service, "USER", false).await;
	let subscriber = super::seed_user(&service, "USER", true).await;
	let admin = super::seed_user(&service, "ADMIN", false).await;

	super::seed_active_item(&service, ItemSeed { code: "501", title: "Open", ..Default::default() })
		.await;
	super::seed_active_item(
		&service,
		ItemSeed { code: "502", title: "Locked", premium: true, ..Default::default() },
	)
	.await;

	let anonymous = service
		.search(&Requester::anonymous(), SearchRequest::default())
		.await
		.expect("Anonymous search failed.");

	assert_eq!(anonymous.pagination.total, 1);
	assert!(anonymous.results.iter().all(|item| !item.premium));

	let err = service
		.search(&Requester::anonymous(), premium_only())
		.await
		.expect_err("Anonymous premium filter must be refused.");

	assert!(matches!(err, Error::Unauthorized { .. }), "{err:?}");

	let err = service
		.search(&Requester::user(member), premium_only())
		.await
		.expect_err("Non-premium member premium filter must be refused.");

	assert!(matches!(err, Error::Unauthorized { .. }), "{err:?}");

	let unrestricted = service
		.search(&Requester::user(member), SearchRequest::default())
		.await
		.expect("Member search failed.");

	assert_eq!(unrestricted.pagination.total, 2);

	for user_id in [subscriber, admin] {
		let response = service
			.search(&Requester::user(user_id), premium_only())
			.await
			.expect("Premium search failed.");
		let codes: Vec<&str> = response.results.iter().map(|item| item.code.as_str()).collect();

		assert_eq!(codes, vec!["502"]);
	}

	let err = service
		.search(&Requester::user(Uuid::new_v4()), SearchRequest::default())
		.await
		.expect_err("Unknown users must be refused.");

	assert!(matches!(err, Error::Unauthorized { .. }), "{err:?}");

	let err = service
		.get_item(&Requester::anonymous(), "502")
		.await
		.expect_err("Anonymous callers must not see premium detail.");

	assert!(matches!(err, Error::NotFound { .. }), "{err:?}");

	let detail =
		service.get_item(&Requester::user(subscriber), "502").await.expect("Detail failed.");

	assert_eq!(detail.summary.title, "Locked");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
