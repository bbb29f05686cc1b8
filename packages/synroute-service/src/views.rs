//! Read views over stored runs, predictions and route trees.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, RouteService, time_serde};
use synroute_domain::tree::{self, FlatNode, TreeNode};
use synroute_storage::{
	models::{PredictionRun, Route, RouteSolvability},
	predictions, routes, solvability,
};

#[derive(Clone, Debug, Serialize)]
pub struct RunView {
	pub run_id: Uuid,
	pub model_id: Uuid,
	pub benchmark_id: Uuid,
	pub total_routes: i32,
	pub avg_route_length: Option<f64>,
	pub run_metadata: Value,
	#[serde(with = "time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time_serde")]
	pub updated_at: OffsetDateTime,
}
impl From<PredictionRun> for RunView {
	fn from(run: PredictionRun) -> Self {
		Self {
			run_id: run.run_id,
			model_id: run.model_id,
			benchmark_id: run.benchmark_id,
			total_routes: run.total_routes,
			avg_route_length: run.avg_route_length,
			run_metadata: run.run_metadata,
			created_at: run.created_at,
			updated_at: run.updated_at,
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct SolvabilityView {
	pub stock_id: Uuid,
	pub is_solvable: bool,
	pub matches_acceptable: bool,
	pub matched_acceptable_index: Option<i32>,
	#[serde(with = "time_serde")]
	pub evaluated_at: OffsetDateTime,
}
impl From<RouteSolvability> for SolvabilityView {
	fn from(row: RouteSolvability) -> Self {
		Self {
			stock_id: row.stock_id,
			is_solvable: row.is_solvable,
			matches_acceptable: row.matches_acceptable,
			matched_acceptable_index: row.matched_acceptable_index,
			evaluated_at: row.evaluated_at,
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct PredictionSummary {
	pub prediction_route_id: Uuid,
	pub route_id: Uuid,
	pub rank: i32,
	pub length: i32,
	pub is_convergent: bool,
	pub solvability: Vec<SolvabilityView>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RouteView {
	pub route_id: Uuid,
	pub signature: String,
	pub content_hash: String,
	pub length: i32,
	pub is_convergent: bool,
	#[serde(with = "time_serde")]
	pub created_at: OffsetDateTime,
}
impl From<Route> for RouteView {
	fn from(route: Route) -> Self {
		Self {
			route_id: route.route_id,
			signature: route.signature,
			content_hash: route.content_hash,
			length: route.length,
			is_convergent: route.is_convergent,
			created_at: route.created_at,
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct RouteTree {
	pub route: RouteView,
	pub root: TreeNode,
}

impl RouteService {
	pub async fn get_run(&self, run_id: Uuid) -> Result<RunView> {
		Ok(self.get_run_row(run_id).await?.into())
	}

	/// A target's predictions in one run, by rank, with every recorded solvability outcome.
	pub async fn list_target_predictions(
		&self,
		run_id: Uuid,
		target_id: Uuid,
	) -> Result<Vec<PredictionSummary>> {
		let mut conn = self.db.pool.acquire().await?;
		let listings = predictions::list_target_predictions(&mut conn, run_id, target_id).await?;
		let ids = listings.iter().map(|listing| listing.prediction_route_id).collect::<Vec<_>>();
		let mut outcomes: HashMap<Uuid, Vec<SolvabilityView>> = HashMap::new();

		for row in solvability::list_solvability(&mut conn, &ids).await? {
			outcomes.entry(row.prediction_route_id).or_default().push(row.into());
		}

		Ok(listings
			.into_iter()
			.map(|listing| PredictionSummary {
				prediction_route_id: listing.prediction_route_id,
				route_id: listing.route_id,
				rank: listing.rank,
				length: listing.length,
				is_convergent: listing.is_convergent,
				solvability: outcomes.remove(&listing.prediction_route_id).unwrap_or_default(),
			})
			.collect())
	}

	/// Reads a stored route back into its nested form.
	pub async fn get_route_tree(&self, route_id: Uuid) -> Result<RouteTree> {
		let mut conn = self.db.pool.acquire().await?;
		let route = routes::get_route(&mut conn, route_id)
			.await?
			.ok_or_else(|| Error::not_found(format!("Route {route_id} does not exist.")))?;
		let nodes = routes::list_route_nodes(&mut conn, route_id)
			.await?
			.into_iter()
			.map(|row| FlatNode {
				id: row.node_id,
				parent: row.parent_node_id,
				position: row.position,
				smiles: row.smiles,
				inchikey: row.inchikey,
				is_leaf: row.is_leaf,
				reaction_hash: row.reaction_hash,
				step_metadata: row.step_metadata,
			})
			.collect::<Vec<_>>();
		let root = tree::build_tree(nodes).map_err(|err| Error::Conflict {
			message: format!("Stored route {route_id} is not a tree: {err}"),
		})?;

		Ok(RouteTree { route: route.into(), root })
	}
}
