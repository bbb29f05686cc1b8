use serde_json::Value;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{PredictionListing, PredictionRoute},
};

/// Links a stored route to a run's target at `rank`. Returns `None` when the link, or another
/// route at the same rank, already exists.
pub async fn insert_prediction_route(
	executor: &mut PgConnection,
	route_id: Uuid,
	run_id: Uuid,
	target_id: Uuid,
	rank: i32,
	prediction_metadata: &Value,
) -> Result<Option<PredictionRoute>> {
	if rank < 1 {
		return Err(Error::InvalidArgument(format!("prediction rank must be >= 1; got {rank}")));
	}

	let row = sqlx::query_as::<_, PredictionRoute>(
		"\
INSERT INTO prediction_routes (
	prediction_route_id,
	route_id,
	run_id,
	target_id,
	rank,
	prediction_metadata,
	created_at
)
VALUES ($1, $2, $3, $4, $5, $6, now())
ON CONFLICT DO NOTHING
RETURNING
	prediction_route_id,
	route_id,
	run_id,
	target_id,
	rank,
	prediction_metadata,
	created_at",
	)
	.bind(Uuid::new_v4())
	.bind(route_id)
	.bind(run_id)
	.bind(target_id)
	.bind(rank)
	.bind(prediction_metadata)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn find_prediction_by_rank(
	executor: &mut PgConnection,
	run_id: Uuid,
	target_id: Uuid,
	rank: i32,
) -> Result<Option<PredictionRoute>> {
	let row = sqlx::query_as::<_, PredictionRoute>(
		"\
SELECT
	prediction_route_id,
	route_id,
	run_id,
	target_id,
	rank,
	prediction_metadata,
	created_at
FROM prediction_routes
WHERE run_id = $1
	AND target_id = $2
	AND rank = $3",
	)
	.bind(run_id)
	.bind(target_id)
	.bind(rank)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn find_prediction(
	executor: &mut PgConnection,
	route_id: Uuid,
	run_id: Uuid,
	target_id: Uuid,
) -> Result<Option<PredictionRoute>> {
	let row = sqlx::query_as::<_, PredictionRoute>(
		"\
SELECT
	prediction_route_id,
	route_id,
	run_id,
	target_id,
	rank,
	prediction_metadata,
	created_at
FROM prediction_routes
WHERE route_id = $1
	AND run_id = $2
	AND target_id = $3",
	)
	.bind(route_id)
	.bind(run_id)
	.bind(target_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn list_target_predictions(
	executor: &mut PgConnection,
	run_id: Uuid,
	target_id: Uuid,
) -> Result<Vec<PredictionListing>> {
	let rows = sqlx::query_as::<_, PredictionListing>(
		"\
SELECT
	p.prediction_route_id,
	p.route_id,
	p.rank,
	r.length,
	r.is_convergent
FROM prediction_routes p
JOIN routes r ON r.route_id = p.route_id
WHERE p.run_id = $1
	AND p.target_id = $2
ORDER BY p.rank",
	)
	.bind(run_id)
	.bind(target_id)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

pub async fn count_route_predictions(executor: &mut PgConnection, route_id: Uuid) -> Result<i64> {
	let count: i64 =
		sqlx::query_scalar("SELECT count(*) FROM prediction_routes WHERE route_id = $1")
			.bind(route_id)
			.fetch_one(&mut *executor)
			.await?;

	Ok(count)
}

/// Removes every prediction of a run. Their solvability rows go with them; routes stay.
pub async fn delete_run_predictions(executor: &mut PgConnection, run_id: Uuid) -> Result<u64> {
	let result = sqlx::query("DELETE FROM prediction_routes WHERE run_id = $1")
		.bind(run_id)
		.execute(&mut *executor)
		.await?;

	Ok(result.rows_affected())
}

pub async fn get_prediction_route(
	executor: &mut PgConnection,
	prediction_route_id: Uuid,
) -> Result<Option<PredictionRoute>> {
	let row = sqlx::query_as::<_, PredictionRoute>(
		"\
SELECT
	prediction_route_id,
	route_id,
	run_id,
	target_id,
	rank,
	prediction_metadata,
	created_at
FROM prediction_routes
WHERE prediction_route_id = $1",
	)
	.bind(prediction_route_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}
