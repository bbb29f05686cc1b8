use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, RouteService, statistics};
use synroute_storage::{catalog, predictions, routes};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClearReport {
	pub predictions_deleted: u64,
	pub total_routes: i32,
	pub avg_route_length: Option<f64>,
}

impl RouteService {
	/// Deletes every prediction of a run, with its solvability outcomes, so a failed load can be
	/// retried. Stored routes and molecules are kept.
	pub async fn clear_run_predictions(&self, run_id: Uuid) -> Result<ClearReport> {
		let mut tx = self.db.pool.begin().await?;

		if catalog::get_run(&mut tx, run_id).await?.is_none() {
			return Err(Error::not_found(format!("Run {run_id} does not exist.")));
		}

		let predictions_deleted = predictions::delete_run_predictions(&mut tx, run_id).await?;
		let aggregates = statistics::refresh_tx(&mut tx, run_id).await?;

		tx.commit().await?;

		tracing::info!(run_id = %run_id, predictions_deleted, "Cleared run predictions.");

		Ok(ClearReport {
			predictions_deleted,
			total_routes: aggregates.total_routes,
			avg_route_length: aggregates.avg_route_length,
		})
	}

	/// Deletes routes that no prediction links to. Waits for in-flight route ingestion and
	/// linking to commit, so a route reused by a running load is never deleted under it.
	pub async fn prune_orphan_routes(&self) -> Result<u64> {
		let mut tx = self.db.pool.begin().await?;

		routes::lock_routes_for_pruning(&mut tx).await?;

		let deleted = routes::delete_orphan_routes(&mut tx).await?;

		tx.commit().await?;

		tracing::info!(deleted, "Pruned orphan routes.");

		Ok(deleted)
	}
}
