use sref_domain::catalog::{CatalogStatus, InteractionKind};
use sref_service::{
	ApproveRequest, Error, ImageInput, RecordInteractionRequest, Requester, SearchRequest,
	SubmitItemRequest,
};

fn submission(code: &str) -> SubmitItemRequest {
	SubmitItemRequest {
		code: code.to_string(),
		title: "Moonlit watercolor".to_string(),
		description: "Soft washes".to_string(),
		prompt_examples: vec!["a harbor at night --sref 7001".to_string()],
		categories: vec!["watercolor".to_string()],
		tags: vec!["Moon".to_string(), "night".to_string()],
		images: vec![ImageInput {
			url: "https://cdn.example.com/7001/0.webp".to_string(),
			thumbnail_url: None,
			width: Some(1024),
			height: Some(1024),
			format: Some("webp".to_string()),
		}],
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SREF_PG_DSN to run."]
async fn submitted_items_move_through_the_lifecycle() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping submitted_items_move_through_the_lifecycle; set SREF_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(super::test_config(test_db.dsn().to_string())).await;
	let owner = super::seed_user(&service, "USER", false).await;
	let stranger = super::seed_user(&service, "USER", false).await;
	let admin = super::seed_user(&service, "ADMIN", false).await;

	super::seed_category(&service, "watercolor").await;

	let err = service
		.submit_item(&Requester::anonymous(), submission("7001"))
		.await
		.expect_err("Anonymous submissions must be refused.");

	assert!(matches!(err, Error::Unauthorized { .. }), "{err:?}");

	let submitted =
		service.submit_item(&Requester::user(owner), submission("7001")).await.expect("Submit failed.");

	assert_eq!(submitted.status, CatalogStatus::Pending);

	let err = service
		.submit_item(&Requester::user(owner), submission("7001"))
		.await
		.expect_err("Duplicate codes must conflict.");

	assert!(matches!(err, Error::Conflict { .. }), "{err:?}");

	let pending = service
		.search(&Requester::anonymous(), SearchRequest::default())
		.await
		.expect("Search failed.");

	assert_eq!(pending.pagination.total, 0);

	let err = service
		.approve_item(&Requester::user(owner), "7001", ApproveRequest::default())
		.await
		.expect_err("Members cannot approve.");

	assert!(matches!(err, Error::Unauthorized { .. }), "{err:?}");

	let approved = service
		.approve_item(
			&Requester::user(admin),
			"7001",
			ApproveRequest { featured: Some(true), ..Default::default() },
		)
		.await
		.expect("Approve failed.");

	assert_eq!(approved.status, CatalogStatus::Active);

	let err = service
		.approve_item(&Requester::user(admin), "7001", ApproveRequest::default())
		.await
		.expect_err("Approving an ACTIVE item must conflict.");

	assert!(matches!(err, Error::Conflict { .. }), "{err:?}");

	let detail = service.get_item(&Requester::anonymous(), "7001").await.expect("Detail failed.");

	assert!(detail.summary.featured);
	assert_eq!(detail.summary.categories, vec!["watercolor".to_string()]);
	assert_eq!(detail.summary.tags, vec!["moon".to_string(), "night".to_string()]);
	assert_eq!(detail.images.len(), 1);

	let viewed = service
		.record_interaction(
			&Requester::anonymous(),
			"7001",
			RecordInteractionRequest { kind: "view".to_string(), referrer: None },
		)
		.await
		.expect("View failed.");

	assert_eq!(viewed.kind, InteractionKind::View);
	assert!(viewed.counted);

	let shared = service
		.record_interaction(
			&Requester::user(stranger),
			"7001",
			RecordInteractionRequest { kind: "SHARE".to_string(), referrer: Some("feed".to_string()) },
		)
		.await
		.expect("Share failed.");

	assert!(!shared.counted);

	let report = service.recompute().await.expect("Recompute failed.");

	assert_eq!(report.categories, 1);

	let categories = service.list_categories().await.expect("Categories failed.");

	assert_eq!(categories[0].sref_count, 1);

	let listed = service
		.search(&Requester::anonymous(), SearchRequest::default())
		.await
		.expect("Search failed.");

	assert_eq!(listed.results.len(), 1);
	assert_eq!(listed.results[0].views, 1);
	assert!((listed.results[0].popularity_score - 1.0).abs() < f64::EPSILON);

	let err = service
		.delete_item(&Requester::user(stranger), "7001")
		.await
		.expect_err("Strangers cannot delete.");

	assert!(matches!(err, Error::Unauthorized { .. }), "{err:?}");

	let deleted =
		service.delete_item(&Requester::user(owner), "7001").await.expect("Delete failed.");

	assert_eq!(deleted.status, CatalogStatus::Deleted);

	let err = service
		.delete_item(&Requester::user(owner), "7001")
		.await
		.expect_err("Repeated delete must be NotFound.");

	assert!(matches!(err, Error::NotFound { .. }), "{err:?}");

	let after = service
		.search(&Requester::anonymous(), SearchRequest::default())
		.await
		.expect("Search failed.");

	assert_eq!(after.pagination.total, 0);

	let deleted_at: Option<time::OffsetDateTime> =
		sqlx::query_scalar("SELECT deleted_at FROM catalog_items WHERE code = '7001'")
			.fetch_one(&service.db.pool)
			.await
			.expect("Item row must survive a soft delete.");

	assert!(deleted_at.is_some());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SREF_PG_DSN to run."]
async fn submissions_are_validated() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping submissions_are_validated; set SREF_PG_DSN to run this test.");

		return;
	};
	let service = super::build_service(super::test_config(test_db.dsn().to_string())).await;
	let owner = super::seed_user(&service, "USER", false).await;
	let requester = Requester::user(owner);

	for (request, field) in [
		(SubmitItemRequest { code: "12ab".to_string(), ..submission("1") }, "$.code"),
		(SubmitItemRequest { title: "  ".to_string(), ..submission("2") }, "$.title"),
		(submission("3"), "$.categories"),
	] {
		let err = service.submit_item(&requester, request).await.expect_err("Must be rejected.");

		assert!(
			matches!(err, Error::InvalidRequest { field: ref actual, .. } if actual == field),
			"{err:?}"
		);
	}

	let err = service
		.record_interaction(
			&requester,
			"3",
			RecordInteractionRequest { kind: "poke".to_string(), referrer: None },
		)
		.await
		.expect_err("Unknown kinds must be rejected.");

	assert!(matches!(err, Error::InvalidRequest { ref field, .. } if field == "$.kind"), "{err:?}");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
