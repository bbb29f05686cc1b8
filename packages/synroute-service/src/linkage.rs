//! Prediction linkage: records that a run predicted a stored route for one of its targets.

use serde_json::{Map, Value};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{Error, Result, RouteService};
use synroute_storage::{catalog, predictions, routes};

impl RouteService {
	pub async fn link_prediction(
		&self,
		route_id: Uuid,
		run_id: Uuid,
		target_id: Uuid,
		rank: u32,
		metadata: Option<&Value>,
	) -> Result<Uuid> {
		let mut tx = self.db.pool.begin().await?;

		routes::lock_routes_for_linking(&mut tx).await?;

		let prediction_route_id =
			link_tx(&mut tx, route_id, run_id, target_id, rank, metadata).await?;

		tx.commit().await?;

		Ok(prediction_route_id)
	}
}

/// Inserts one link. A second link of the same route to the same run and target, or a second
/// route at an occupied rank, is rejected as duplicate input.
pub(crate) async fn link_tx(
	conn: &mut PgConnection,
	route_id: Uuid,
	run_id: Uuid,
	target_id: Uuid,
	rank: u32,
	metadata: Option<&Value>,
) -> Result<Uuid> {
	let rank = crate::rank_to_db(rank)?;
	let run = catalog::get_run(conn, run_id)
		.await?
		.ok_or_else(|| Error::not_found(format!("Run {run_id} does not exist.")))?;
	let target = catalog::get_target(conn, target_id)
		.await?
		.ok_or_else(|| Error::not_found(format!("Target {target_id} does not exist.")))?;

	if target.benchmark_id != run.benchmark_id {
		return Err(Error::invalid(format!(
			"Target {} does not belong to the benchmark of run {run_id}.",
			target.external_target_id
		)));
	}
	if routes::get_route(conn, route_id).await?.is_none() {
		return Err(Error::not_found(format!("Route {route_id} does not exist.")));
	}

	let metadata = match metadata {
		Some(value) if !value.is_object() =>
			return Err(Error::invalid("prediction metadata must be a JSON object.")),
		Some(value) => value.clone(),
		None => Value::Object(Map::new()),
	};

	if let Some(link) =
		predictions::insert_prediction_route(conn, route_id, run_id, target_id, rank, &metadata)
			.await?
	{
		return Ok(link.prediction_route_id);
	}

	if let Some(existing) = predictions::find_prediction(conn, route_id, run_id, target_id).await? {
		return Err(Error::DuplicateInput {
			message: format!(
				"Route {route_id} is already linked to target {} in run {run_id} at rank {}.",
				target.external_target_id, existing.rank
			),
		});
	}

	Err(Error::DuplicateInput {
		message: format!(
			"Rank {rank} of target {} in run {run_id} is already taken.",
			target.external_target_id
		),
	})
}
