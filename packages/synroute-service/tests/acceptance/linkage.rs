use synroute_service::Error;

use super::{build_service, convergent_route, count, one_step_route, seed, target_input, test_db};

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn linking_the_same_route_twice_is_duplicate_input() {
	let Some(test_db) = test_db("linking_the_same_route_twice_is_duplicate_input").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let (target, runs) = seed(&service, &["model-a"]).await;
	let route = service
		.get_or_create_route("sig", "hash", &convergent_route())
		.await
		.expect("Failed to store route.");

	service
		.link_prediction(route.route_id, runs[0].run_id, target.target_id, 1, None)
		.await
		.expect("First link failed.");

	let err = service
		.link_prediction(route.route_id, runs[0].run_id, target.target_id, 2, None)
		.await
		.expect_err("Second link must be rejected.");

	assert!(matches!(err, Error::DuplicateInput { .. }), "Unexpected error: {err:?}.");
	assert_eq!(count(&service, "SELECT count(*) FROM prediction_routes").await, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn occupied_rank_is_duplicate_input() {
	let Some(test_db) = test_db("occupied_rank_is_duplicate_input").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let (target, runs) = seed(&service, &["model-a"]).await;
	let first = service
		.get_or_create_route("sig-a", "a", &convergent_route())
		.await
		.expect("Failed to store route.");
	let second = service
		.get_or_create_route("sig-b", "b", &one_step_route())
		.await
		.expect("Failed to store route.");

	service
		.link_prediction(first.route_id, runs[0].run_id, target.target_id, 1, None)
		.await
		.expect("First link failed.");

	let err = service
		.link_prediction(second.route_id, runs[0].run_id, target.target_id, 1, None)
		.await
		.expect_err("A taken rank must be rejected.");

	assert_eq!(err.code(), "DUPLICATE_INPUT");

	let err = service
		.link_prediction(second.route_id, runs[0].run_id, target.target_id, 0, None)
		.await
		.expect_err("Rank zero must be rejected.");

	assert_eq!(err.code(), "INVALID_REQUEST");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn target_from_another_benchmark_is_rejected() {
	let Some(test_db) = test_db("target_from_another_benchmark_is_rejected").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let (_, runs) = seed(&service, &["model-a"]).await;
	let other = service.ensure_benchmark("other", None).await.expect("Failed to create benchmark.");
	let foreign = service
		.register_target(other.benchmark_id, "t-1", &target_input())
		.await
		.expect("Failed to register target.");
	let route = service
		.get_or_create_route("sig", "hash", &convergent_route())
		.await
		.expect("Failed to store route.");
	let err = service
		.link_prediction(route.route_id, runs[0].run_id, foreign.target_id, 1, None)
		.await
		.expect_err("A foreign target must be rejected.");

	assert_eq!(err.code(), "INVALID_REQUEST");
	assert_eq!(count(&service, "SELECT count(*) FROM prediction_routes").await, 0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
