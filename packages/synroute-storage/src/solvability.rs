use sqlx::PgConnection;
use uuid::Uuid;

use crate::{Result, models::RouteSolvability};

/// Records, or replaces, the outcome of one prediction against one stock.
pub async fn upsert_route_solvability(
	executor: &mut PgConnection,
	prediction_route_id: Uuid,
	stock_id: Uuid,
	is_solvable: bool,
	matches_acceptable: bool,
	matched_acceptable_index: Option<i32>,
) -> Result<RouteSolvability> {
	let row = sqlx::query_as::<_, RouteSolvability>(
		"\
INSERT INTO route_solvability (
	solvability_id,
	prediction_route_id,
	stock_id,
	is_solvable,
	matches_acceptable,
	matched_acceptable_index,
	evaluated_at
)
VALUES ($1, $2, $3, $4, $5, $6, now())
ON CONFLICT (prediction_route_id, stock_id)
DO UPDATE
SET
	is_solvable = EXCLUDED.is_solvable,
	matches_acceptable = EXCLUDED.matches_acceptable,
	matched_acceptable_index = EXCLUDED.matched_acceptable_index,
	evaluated_at = now()
RETURNING
	solvability_id,
	prediction_route_id,
	stock_id,
	is_solvable,
	matches_acceptable,
	matched_acceptable_index,
	evaluated_at",
	)
	.bind(Uuid::new_v4())
	.bind(prediction_route_id)
	.bind(stock_id)
	.bind(is_solvable)
	.bind(matches_acceptable)
	.bind(matched_acceptable_index)
	.fetch_one(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn list_solvability(
	executor: &mut PgConnection,
	prediction_route_ids: &[Uuid],
) -> Result<Vec<RouteSolvability>> {
	if prediction_route_ids.is_empty() {
		return Ok(vec![]);
	}

	let rows = sqlx::query_as::<_, RouteSolvability>(
		"\
SELECT
	solvability_id,
	prediction_route_id,
	stock_id,
	is_solvable,
	matches_acceptable,
	matched_acceptable_index,
	evaluated_at
FROM route_solvability
WHERE prediction_route_id = ANY($1::uuid[])
ORDER BY prediction_route_id, stock_id",
	)
	.bind(prediction_route_ids)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}
