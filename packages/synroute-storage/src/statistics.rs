use serde_json::Value;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
	Result,
	models::{MetricGroup, ModelRunStatistics, PredictionRun},
};

/// Stores the metrics object for `(run_id, stock_id)`, replacing any earlier one. Returns the
/// statistics id, stable across replacements.
pub async fn upsert_run_statistics(
	executor: &mut PgConnection,
	run_id: Uuid,
	benchmark_id: Uuid,
	stock_id: Uuid,
	statistics_json: &Value,
) -> Result<Uuid> {
	let row: (Uuid,) = sqlx::query_as(
		"\
INSERT INTO model_run_statistics (
	statistics_id,
	run_id,
	benchmark_id,
	stock_id,
	statistics_json,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, now(), now())
ON CONFLICT (run_id, stock_id)
DO UPDATE
SET
	benchmark_id = EXCLUDED.benchmark_id,
	statistics_json = EXCLUDED.statistics_json,
	updated_at = now()
RETURNING statistics_id",
	)
	.bind(Uuid::new_v4())
	.bind(run_id)
	.bind(benchmark_id)
	.bind(stock_id)
	.bind(statistics_json)
	.fetch_one(&mut *executor)
	.await?;

	Ok(row.0)
}

/// Swaps the metric rows of `statistics_id` for `groups`.
pub async fn replace_metric_groups(
	executor: &mut PgConnection,
	statistics_id: Uuid,
	groups: &[MetricGroup],
) -> Result<()> {
	sqlx::query("DELETE FROM stratified_metric_groups WHERE statistics_id = $1")
		.bind(statistics_id)
		.execute(&mut *executor)
		.await?;

	if groups.is_empty() {
		return Ok(());
	}

	let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
		"\
INSERT INTO stratified_metric_groups (
	metric_group_id,
	statistics_id,
	metric_name,
	group_key,
	value,
	ci_lower,
	ci_upper,
	n_samples,
	reliability_code,
	reliability_message
) ",
	);

	builder.push_values(groups, |mut row, group| {
		row.push_bind(Uuid::new_v4())
			.push_bind(statistics_id)
			.push_bind(group.metric_name.as_str())
			.push_bind(group.group_key.as_deref())
			.push_bind(group.value)
			.push_bind(group.ci_lower)
			.push_bind(group.ci_upper)
			.push_bind(group.n_samples)
			.push_bind(group.reliability_code.as_str())
			.push_bind(group.reliability_message.as_str());
	});
	builder.build().execute(&mut *executor).await?;

	Ok(())
}

pub async fn get_run_statistics(
	executor: &mut PgConnection,
	run_id: Uuid,
	stock_id: Uuid,
) -> Result<Option<ModelRunStatistics>> {
	let row = sqlx::query_as::<_, ModelRunStatistics>(
		"\
SELECT
	statistics_id,
	run_id,
	benchmark_id,
	stock_id,
	statistics_json,
	created_at,
	updated_at
FROM model_run_statistics
WHERE run_id = $1
	AND stock_id = $2",
	)
	.bind(run_id)
	.bind(stock_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn list_metric_groups(
	executor: &mut PgConnection,
	statistics_id: Uuid,
) -> Result<Vec<MetricGroup>> {
	let rows = sqlx::query_as::<_, MetricGroup>(
		"\
SELECT
	metric_name,
	group_key,
	value,
	ci_lower,
	ci_upper,
	n_samples,
	reliability_code,
	reliability_message
FROM stratified_metric_groups
WHERE statistics_id = $1
ORDER BY metric_name, group_key NULLS FIRST",
	)
	.bind(statistics_id)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

/// Recomputes `total_routes` and `avg_route_length` from the run's current predictions.
pub async fn refresh_run_aggregates(
	executor: &mut PgConnection,
	run_id: Uuid,
) -> Result<Option<PredictionRun>> {
	let row = sqlx::query_as::<_, PredictionRun>(
		"\
UPDATE prediction_runs pr
SET
	total_routes = agg.total_routes,
	avg_route_length = agg.avg_route_length,
	updated_at = now()
FROM (
	SELECT
		count(*)::integer AS total_routes,
		avg(r.length)::double precision AS avg_route_length
	FROM prediction_routes p
	JOIN routes r ON r.route_id = p.route_id
	WHERE p.run_id = $1
) agg
WHERE pr.run_id = $1
RETURNING
	pr.run_id,
	pr.model_id,
	pr.benchmark_id,
	pr.total_routes,
	pr.avg_route_length,
	pr.run_metadata,
	pr.created_at,
	pr.updated_at",
	)
	.bind(run_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}
