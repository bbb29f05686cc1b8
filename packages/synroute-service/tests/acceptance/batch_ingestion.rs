use std::{collections::BTreeMap, time::Duration};

use synroute_domain::route::EvaluationOutcome;

use super::{build_service, convergent_route, count, one_step_route, route_input, seed, test_db};

fn outcome(rank: u32, is_solved: bool) -> EvaluationOutcome {
	EvaluationOutcome { rank, is_solved, matches_acceptable: false, matched_acceptable_index: None }
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn run_batch_reports_item_failures_and_keeps_going() {
	let Some(test_db) = test_db("run_batch_reports_item_failures_and_keeps_going").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let (target, runs) = seed(&service, &["model-a"]).await;
	let run = &runs[0];
	let mut malformed = convergent_route();

	malformed.is_leaf = Some(true);

	let routes = BTreeMap::from([
		(
			"t-1".to_string(),
			vec![
				route_input(convergent_route(), 1, "r1"),
				route_input(one_step_route(), 2, "r2"),
				route_input(malformed, 3, "r3"),
				route_input(convergent_route(), 4, "r1"),
			],
		),
		("t-9".to_string(), vec![route_input(one_step_route(), 1, "r2")]),
	]);
	let summary =
		service.ingest_run_routes(run.run_id, &routes).await.expect("Batch ingestion failed.");

	assert_eq!(summary.routes_created, 2);
	assert_eq!(summary.routes_reused, 0);
	assert_eq!(summary.predictions_linked, 2);
	assert_eq!(summary.failed, 3);

	let kinds = summary
		.failures
		.iter()
		.map(|failure| (failure.external_target_id.as_str(), failure.rank, failure.kind.as_str()))
		.collect::<Vec<_>>();

	assert_eq!(
		kinds,
		vec![
			("t-1", Some(3), "MALFORMED_TREE"),
			("t-1", Some(4), "DUPLICATE_INPUT"),
			("t-9", Some(1), "NOT_FOUND"),
		]
	);
	assert_eq!(count(&service, "SELECT count(*) FROM routes").await, 2);

	let view = service.get_run(run.run_id).await.expect("Failed to read run.");

	assert_eq!(view.total_routes, 2);
	assert_eq!(view.avg_route_length, Some(1.5));

	let predictions = service
		.list_target_predictions(run.run_id, target.target_id)
		.await
		.expect("Failed to list predictions.");

	assert_eq!(predictions.iter().map(|p| (p.rank, p.length)).collect::<Vec<_>>(), vec![
		(1, 2),
		(2, 1)
	]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn second_run_reuses_routes_from_the_first() {
	let Some(test_db) = test_db("second_run_reuses_routes_from_the_first").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let (_, runs) = seed(&service, &["model-a", "model-b"]).await;
	let first = BTreeMap::from([(
		"t-1".to_string(),
		vec![route_input(convergent_route(), 1, "r1"), route_input(one_step_route(), 2, "r2")],
	)]);
	let second = BTreeMap::from([(
		"t-1".to_string(),
		vec![route_input(one_step_route(), 1, "r2")],
	)]);

	service.ingest_run_routes(runs[0].run_id, &first).await.expect("First batch failed.");

	let summary =
		service.ingest_run_routes(runs[1].run_id, &second).await.expect("Second batch failed.");

	assert_eq!(summary.routes_created, 0);
	assert_eq!(summary.routes_reused, 1);
	assert_eq!(summary.predictions_linked, 1);
	assert_eq!(count(&service, "SELECT count(*) FROM routes").await, 2);
	assert_eq!(count(&service, "SELECT count(*) FROM prediction_routes").await, 3);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn evaluations_attach_to_predictions_by_rank() {
	let Some(test_db) = test_db("evaluations_attach_to_predictions_by_rank").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let (target, runs) = seed(&service, &["model-a"]).await;
	let run = &runs[0];
	let routes = BTreeMap::from([(
		"t-1".to_string(),
		vec![route_input(convergent_route(), 1, "r1"), route_input(one_step_route(), 2, "r2")],
	)]);

	service.ingest_run_routes(run.run_id, &routes).await.expect("Batch ingestion failed.");

	let outcomes = BTreeMap::from([
		("t-1".to_string(), vec![outcome(1, true), outcome(2, false), outcome(7, true)]),
		("t-9".to_string(), vec![outcome(1, true)]),
	]);
	let summary = service
		.ingest_evaluations(run.run_id, "buyables", &outcomes)
		.await
		.expect("Evaluation ingestion failed.");

	assert_eq!(summary.recorded, 2);
	assert_eq!(summary.failed, 2);
	assert!(summary.failures.iter().all(|failure| failure.kind == "NOT_FOUND"));

	// Re-evaluation overwrites instead of appending.
	let again = BTreeMap::from([("t-1".to_string(), vec![outcome(2, true)])]);

	service
		.ingest_evaluations(run.run_id, "buyables", &again)
		.await
		.expect("Evaluation ingestion failed.");

	let predictions = service
		.list_target_predictions(run.run_id, target.target_id)
		.await
		.expect("Failed to list predictions.");
	let solved = predictions
		.iter()
		.map(|p| p.solvability.iter().map(|s| s.is_solvable).collect::<Vec<_>>())
		.collect::<Vec<_>>();

	assert_eq!(solved, vec![vec![true], vec![true]]);
	assert_eq!(count(&service, "SELECT count(*) FROM route_solvability").await, 2);

	let err = service
		.record_solvability(
			predictions[0].prediction_route_id,
			predictions[0].solvability[0].stock_id,
			true,
			false,
			Some(0),
		)
		.await
		.expect_err("An index without a match must be rejected.");

	assert_eq!(err.code(), "INVALID_REQUEST");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn clearing_a_run_keeps_routes_until_pruned() {
	let Some(test_db) = test_db("clearing_a_run_keeps_routes_until_pruned").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let (_, runs) = seed(&service, &["model-a", "model-b"]).await;
	let shared = BTreeMap::from([(
		"t-1".to_string(),
		vec![route_input(convergent_route(), 1, "r1"), route_input(one_step_route(), 2, "r2")],
	)]);
	let only_shared = BTreeMap::from([(
		"t-1".to_string(),
		vec![route_input(convergent_route(), 1, "r1")],
	)]);

	service.ingest_run_routes(runs[0].run_id, &shared).await.expect("First batch failed.");
	service.ingest_run_routes(runs[1].run_id, &only_shared).await.expect("Second batch failed.");

	let report = service.clear_run_predictions(runs[0].run_id).await.expect("Clear failed.");

	assert_eq!(report.predictions_deleted, 2);
	assert_eq!(report.total_routes, 0);
	assert_eq!(report.avg_route_length, None);
	assert_eq!(count(&service, "SELECT count(*) FROM routes").await, 2);

	let pruned = service.prune_orphan_routes().await.expect("Prune failed.");

	assert_eq!(pruned, 1);
	assert_eq!(count(&service, "SELECT count(*) FROM routes").await, 1);
	assert_eq!(count(&service, "SELECT count(*) FROM route_nodes").await, 4);

	// The cleared run can be loaded again.
	let summary =
		service.ingest_run_routes(runs[0].run_id, &shared).await.expect("Reload failed.");

	assert_eq!(summary.routes_created, 1);
	assert_eq!(summary.routes_reused, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn pruning_waits_for_in_flight_links() {
	let Some(test_db) = test_db("pruning_waits_for_in_flight_links").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let (target, runs) = seed(&service, &["model-a"]).await;
	let stored = service
		.get_or_create_route("r1", "hash-r1", &convergent_route())
		.await
		.expect("Failed to store route.");
	let mut tx = service.db.pool.begin().await.expect("Failed to begin transaction.");

	synroute_storage::routes::lock_routes_for_linking(&mut tx)
		.await
		.expect("Failed to take link lock.");

	// The route is still unlinked while the prune starts.
	let link_and_commit = async {
		tokio::time::sleep(Duration::from_millis(200)).await;

		synroute_storage::predictions::insert_prediction_route(
			&mut tx,
			stored.route_id,
			runs[0].run_id,
			target.target_id,
			1,
			&serde_json::json!({}),
		)
		.await
		.expect("Failed to link route.")
		.expect("Link must be new.");

		tx.commit().await.expect("Failed to commit link.");
	};
	let (pruned, ()) = tokio::join!(service.prune_orphan_routes(), link_and_commit);

	assert_eq!(pruned.expect("Prune failed."), 0);
	assert_eq!(count(&service, "SELECT count(*) FROM routes").await, 1);
	assert_eq!(count(&service, "SELECT count(*) FROM prediction_routes").await, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
