//! Stocks, benchmarks, targets, models and runs: the records route ingestion hangs off.

use serde_json::Value;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{Benchmark, BenchmarkTarget, Model, PredictionRun, Stock},
};

fn require_name(field: &str, value: &str) -> Result<()> {
	if value.trim().is_empty() {
		return Err(Error::InvalidArgument(format!("{field} must not be empty")));
	}

	Ok(())
}

pub async fn ensure_stock(
	executor: &mut PgConnection,
	name: &str,
	description: Option<&str>,
) -> Result<Stock> {
	require_name("stock name", name)?;

	let row = sqlx::query_as::<_, Stock>(
		"\
INSERT INTO stocks (stock_id, name, description, created_at)
VALUES ($1, $2, $3, now())
ON CONFLICT (name)
DO UPDATE
SET description = COALESCE(EXCLUDED.description, stocks.description)
RETURNING stock_id, name, description, created_at",
	)
	.bind(Uuid::new_v4())
	.bind(name.trim())
	.bind(description)
	.fetch_one(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn find_stock_by_name(executor: &mut PgConnection, name: &str) -> Result<Option<Stock>> {
	let row = sqlx::query_as::<_, Stock>(
		"\
SELECT stock_id, name, description, created_at
FROM stocks
WHERE name = $1",
	)
	.bind(name.trim())
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn get_stock(executor: &mut PgConnection, stock_id: Uuid) -> Result<Option<Stock>> {
	let row = sqlx::query_as::<_, Stock>(
		"\
SELECT stock_id, name, description, created_at
FROM stocks
WHERE stock_id = $1",
	)
	.bind(stock_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn ensure_benchmark(
	executor: &mut PgConnection,
	name: &str,
	stock_id: Option<Uuid>,
) -> Result<Benchmark> {
	require_name("benchmark name", name)?;

	let row = sqlx::query_as::<_, Benchmark>(
		"\
INSERT INTO benchmarks (benchmark_id, name, stock_id, created_at)
VALUES ($1, $2, $3, now())
ON CONFLICT (name)
DO UPDATE
SET stock_id = COALESCE(EXCLUDED.stock_id, benchmarks.stock_id)
RETURNING benchmark_id, name, stock_id, created_at",
	)
	.bind(Uuid::new_v4())
	.bind(name.trim())
	.bind(stock_id)
	.fetch_one(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn find_benchmark_by_name(
	executor: &mut PgConnection,
	name: &str,
) -> Result<Option<Benchmark>> {
	let row = sqlx::query_as::<_, Benchmark>(
		"\
SELECT benchmark_id, name, stock_id, created_at
FROM benchmarks
WHERE name = $1",
	)
	.bind(name.trim())
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn ensure_model(
	executor: &mut PgConnection,
	name: &str,
	version: Option<&str>,
) -> Result<Model> {
	require_name("model name", name)?;

	let row = sqlx::query_as::<_, Model>(
		"\
INSERT INTO models (model_id, name, version, created_at)
VALUES ($1, $2, $3, now())
ON CONFLICT (name)
DO UPDATE
SET version = COALESCE(EXCLUDED.version, models.version)
RETURNING model_id, name, version, created_at",
	)
	.bind(Uuid::new_v4())
	.bind(name.trim())
	.bind(version)
	.fetch_one(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn find_model_by_name(executor: &mut PgConnection, name: &str) -> Result<Option<Model>> {
	let row = sqlx::query_as::<_, Model>(
		"\
SELECT model_id, name, version, created_at
FROM models
WHERE name = $1",
	)
	.bind(name.trim())
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

/// Returns the run of `model_id` on `benchmark_id`, creating it when absent. Supplied metadata
/// replaces the stored metadata.
pub async fn upsert_run(
	executor: &mut PgConnection,
	model_id: Uuid,
	benchmark_id: Uuid,
	run_metadata: Option<&Value>,
) -> Result<PredictionRun> {
	let row = sqlx::query_as::<_, PredictionRun>(
		"\
INSERT INTO prediction_runs (
	run_id,
	model_id,
	benchmark_id,
	total_routes,
	avg_route_length,
	run_metadata,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, 0, NULL, COALESCE($4, '{}'::jsonb), now(), now())
ON CONFLICT (model_id, benchmark_id)
DO UPDATE
SET
	run_metadata = COALESCE($4, prediction_runs.run_metadata),
	updated_at = now()
RETURNING
	run_id,
	model_id,
	benchmark_id,
	total_routes,
	avg_route_length,
	run_metadata,
	created_at,
	updated_at",
	)
	.bind(Uuid::new_v4())
	.bind(model_id)
	.bind(benchmark_id)
	.bind(run_metadata)
	.fetch_one(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn get_run(executor: &mut PgConnection, run_id: Uuid) -> Result<Option<PredictionRun>> {
	let row = sqlx::query_as::<_, PredictionRun>(
		"\
SELECT
	run_id,
	model_id,
	benchmark_id,
	total_routes,
	avg_route_length,
	run_metadata,
	created_at,
	updated_at
FROM prediction_runs
WHERE run_id = $1",
	)
	.bind(run_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn find_run(
	executor: &mut PgConnection,
	model_id: Uuid,
	benchmark_id: Uuid,
) -> Result<Option<PredictionRun>> {
	let row = sqlx::query_as::<_, PredictionRun>(
		"\
SELECT
	run_id,
	model_id,
	benchmark_id,
	total_routes,
	avg_route_length,
	run_metadata,
	created_at,
	updated_at
FROM prediction_runs
WHERE model_id = $1
	AND benchmark_id = $2",
	)
	.bind(model_id)
	.bind(benchmark_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

/// Registers a benchmark target, or refreshes the reference route shape of an existing one.
/// The target's molecule is never reassigned.
pub async fn upsert_target(
	executor: &mut PgConnection,
	benchmark_id: Uuid,
	external_target_id: &str,
	molecule_id: Uuid,
	route_length: Option<i32>,
	is_convergent: Option<bool>,
) -> Result<BenchmarkTarget> {
	require_name("external target id", external_target_id)?;

	let row = sqlx::query_as::<_, BenchmarkTarget>(
		"\
INSERT INTO benchmark_targets (
	target_id,
	benchmark_id,
	external_target_id,
	molecule_id,
	route_length,
	is_convergent,
	created_at
)
VALUES ($1, $2, $3, $4, $5, $6, now())
ON CONFLICT (benchmark_id, external_target_id)
DO UPDATE
SET
	route_length = COALESCE(EXCLUDED.route_length, benchmark_targets.route_length),
	is_convergent = COALESCE(EXCLUDED.is_convergent, benchmark_targets.is_convergent)
RETURNING
	target_id,
	benchmark_id,
	external_target_id,
	molecule_id,
	route_length,
	is_convergent,
	created_at",
	)
	.bind(Uuid::new_v4())
	.bind(benchmark_id)
	.bind(external_target_id.trim())
	.bind(molecule_id)
	.bind(route_length)
	.bind(is_convergent)
	.fetch_one(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn find_target(
	executor: &mut PgConnection,
	benchmark_id: Uuid,
	external_target_id: &str,
) -> Result<Option<BenchmarkTarget>> {
	let row = sqlx::query_as::<_, BenchmarkTarget>(
		"\
SELECT
	target_id,
	benchmark_id,
	external_target_id,
	molecule_id,
	route_length,
	is_convergent,
	created_at
FROM benchmark_targets
WHERE benchmark_id = $1
	AND external_target_id = $2",
	)
	.bind(benchmark_id)
	.bind(external_target_id.trim())
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn get_target(
	executor: &mut PgConnection,
	target_id: Uuid,
) -> Result<Option<BenchmarkTarget>> {
	let row = sqlx::query_as::<_, BenchmarkTarget>(
		"\
SELECT
	target_id,
	benchmark_id,
	external_target_id,
	molecule_id,
	route_length,
	is_convergent,
	created_at
FROM benchmark_targets
WHERE target_id = $1",
	)
	.bind(target_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}
