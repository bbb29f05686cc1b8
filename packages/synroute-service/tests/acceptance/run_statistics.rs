use std::collections::BTreeMap;

use synroute_domain::metrics::{
	EvaluatorMetricResult, EvaluatorStatistics, EvaluatorStratifiedMetric, Reliability,
};

use super::{build_service, count, seed, test_db};

fn metric(value: f64, n_samples: u32) -> EvaluatorMetricResult {
	EvaluatorMetricResult {
		value,
		ci_lower: (value - 0.1).max(0.0),
		ci_upper: (value + 0.1).min(1.0),
		n_samples,
		reliability: Reliability { code: "OK".to_string(), message: String::new() },
	}
}

fn evaluator_statistics(solvability: f64, with_groups: bool) -> EvaluatorStatistics {
	let by_group = with_groups.then(|| {
		BTreeMap::from([
			("length-2".to_string(), metric(solvability, 10)),
			("length-3".to_string(), metric(solvability / 2.0, 10)),
		])
	});

	EvaluatorStatistics {
		solvability: EvaluatorStratifiedMetric { overall: metric(solvability, 20), by_group },
		top_k_accuracy: Some(BTreeMap::from([(
			1,
			EvaluatorStratifiedMetric { overall: metric(0.4, 20), by_group: None },
		)])),
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn recording_statistics_twice_replaces_rows() {
	let Some(test_db) = test_db("recording_statistics_twice_replaces_rows").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let (_, runs) = seed(&service, &["model-a"]).await;
	let run = &runs[0];
	let stock = service.find_stock_by_name("buyables").await.expect("Failed to find stock.");
	let first = service
		.record_run_statistics(
			run.run_id,
			run.benchmark_id,
			stock.stock_id,
			evaluator_statistics(0.8, true),
		)
		.await
		.expect("Failed to record statistics.");

	assert_eq!(count(&service, "SELECT count(*) FROM stratified_metric_groups").await, 4);

	let second = service
		.record_run_statistics(
			run.run_id,
			run.benchmark_id,
			stock.stock_id,
			evaluator_statistics(0.6, false),
		)
		.await
		.expect("Failed to record statistics.");

	assert_eq!(first, second);
	assert_eq!(count(&service, "SELECT count(*) FROM model_run_statistics").await, 1);
	assert_eq!(count(&service, "SELECT count(*) FROM stratified_metric_groups").await, 2);

	let stats =
		service.get_run_statistics(run.run_id, stock.stock_id).await.expect("Missing statistics.");

	assert_eq!(stats.solvability.overall.value, 0.6);
	assert!(stats.solvability.by_group.is_none());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn stored_blob_is_camel_case() {
	let Some(test_db) = test_db("stored_blob_is_camel_case").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let (_, runs) = seed(&service, &["model-a"]).await;
	let run = &runs[0];
	let stock = service.find_stock_by_name("buyables").await.expect("Failed to find stock.");

	service
		.record_run_statistics(
			run.run_id,
			run.benchmark_id,
			stock.stock_id,
			evaluator_statistics(0.8, true),
		)
		.await
		.expect("Failed to record statistics.");

	let blob: serde_json::Value =
		sqlx::query_scalar("SELECT statistics_json FROM model_run_statistics")
			.fetch_one(&service.db.pool)
			.await
			.expect("Failed to read blob.");

	assert!(blob.get("topKAccuracy").is_some());
	assert!(blob["solvability"].get("byGroup").is_some());
	assert!(blob["solvability"]["overall"].get("ciLower").is_some());
	assert!(blob["solvability"]["overall"].get("ci_lower").is_none());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn unreadable_blob_is_rebuilt_from_rows() {
	let Some(test_db) = test_db("unreadable_blob_is_rebuilt_from_rows").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let (_, runs) = seed(&service, &["model-a"]).await;
	let run = &runs[0];
	let stock = service.find_stock_by_name("buyables").await.expect("Failed to find stock.");

	service
		.record_run_statistics(
			run.run_id,
			run.benchmark_id,
			stock.stock_id,
			evaluator_statistics(0.8, true),
		)
		.await
		.expect("Failed to record statistics.");

	let expected =
		service.get_run_statistics(run.run_id, stock.stock_id).await.expect("Missing statistics.");

	sqlx::query("UPDATE model_run_statistics SET statistics_json = '\"bad\"'::jsonb")
		.execute(&service.db.pool)
		.await
		.expect("Failed to corrupt blob.");

	let rebuilt =
		service.get_run_statistics(run.run_id, stock.stock_id).await.expect("Missing statistics.");

	assert_eq!(rebuilt, expected);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn blank_group_key_is_stored_next_to_overall() {
	let Some(test_db) = test_db("blank_group_key_is_stored_next_to_overall").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let (_, runs) = seed(&service, &["model-a"]).await;
	let run = &runs[0];
	let stock = service.find_stock_by_name("buyables").await.expect("Failed to find stock.");
	let mut input = evaluator_statistics(0.8, false);

	input.solvability.by_group = Some(BTreeMap::from([(String::new(), metric(0.3, 5))]));

	service
		.record_run_statistics(run.run_id, run.benchmark_id, stock.stock_id, input)
		.await
		.expect("Failed to record statistics.");

	assert_eq!(count(&service, "SELECT count(*) FROM stratified_metric_groups").await, 3);

	let stored =
		service.get_run_statistics(run.run_id, stock.stock_id).await.expect("Missing statistics.");

	sqlx::query("UPDATE model_run_statistics SET statistics_json = '\"bad\"'::jsonb")
		.execute(&service.db.pool)
		.await
		.expect("Failed to corrupt blob.");

	let rebuilt =
		service.get_run_statistics(run.run_id, stock.stock_id).await.expect("Missing statistics.");

	for stats in [&stored, &rebuilt] {
		assert_eq!(stats.solvability.overall.value, 0.8);
		assert_eq!(
			stats.solvability.by_group.as_ref().map(|groups| groups[""].value),
			Some(0.3)
		);
	}

	assert_eq!(rebuilt, stored);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn statistics_for_a_foreign_benchmark_are_rejected() {
	let Some(test_db) = test_db("statistics_for_a_foreign_benchmark_are_rejected").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let (_, runs) = seed(&service, &["model-a"]).await;
	let other = service.ensure_benchmark("other", None).await.expect("Failed to create benchmark.");
	let stock = service.find_stock_by_name("buyables").await.expect("Failed to find stock.");
	let err = service
		.record_run_statistics(
			runs[0].run_id,
			other.benchmark_id,
			stock.stock_id,
			evaluator_statistics(0.8, false),
		)
		.await
		.expect_err("Mismatched benchmark must be rejected.");

	assert_eq!(err.code(), "INVALID_REQUEST");
	assert_eq!(count(&service, "SELECT count(*) FROM model_run_statistics").await, 0);

	let err = service
		.get_run_statistics(runs[0].run_id, stock.stock_id)
		.await
		.expect_err("Nothing was recorded.");

	assert_eq!(err.code(), "NOT_FOUND");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
