//! Batch ingestion of one run's predicted routes.
//!
//! Each route is planned, deduplicated, materialized when new and linked in its own
//! transaction. Item errors are collected into the summary; store failures abort the batch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, RouteService, linkage, routes};
use synroute_domain::{plan::RoutePlan, route::RouteInput};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteIngested {
	pub route_id: Uuid,
	pub prediction_route_id: Uuid,
	pub was_reused: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestFailure {
	pub external_target_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rank: Option<u32>,
	pub kind: String,
	pub message: String,
}
impl IngestFailure {
	pub(crate) fn new(external_target_id: &str, rank: Option<u32>, err: &Error) -> Self {
		Self {
			external_target_id: external_target_id.to_string(),
			rank,
			kind: err.code().to_string(),
			message: err.to_string(),
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
	pub routes_created: u64,
	pub routes_reused: u64,
	pub predictions_linked: u64,
	pub failed: u64,
	pub failures: Vec<IngestFailure>,
}
impl IngestSummary {
	fn record_failure(&mut self, external_target_id: &str, rank: Option<u32>, err: &Error) {
		tracing::warn!(
			external_target_id,
			rank = ?rank,
			error = %err,
			"Route ingestion failed for one prediction."
		);

		self.failed += 1;
		self.failures.push(IngestFailure::new(external_target_id, rank, err));
	}
}

impl RouteService {
	/// Stores one predicted route for `target_id` and links it to `run_id`.
	pub async fn ingest_route(
		&self,
		run_id: Uuid,
		target_id: Uuid,
		route: &RouteInput,
	) -> Result<RouteIngested> {
		let plan = RoutePlan::from_tree(&route.target, &self.cfg.ingest)?;
		let mut tx = self.db.pool.begin().await?;

		synroute_storage::routes::lock_routes_for_linking(&mut tx).await?;

		let outcome = routes::get_or_create_route_tx(
			&mut tx,
			&route.signature,
			&route.content_hash,
			&plan,
			self.node_batch_size(),
		)
		.await?;
		let prediction_route_id = linkage::link_tx(
			&mut tx,
			outcome.route_id,
			run_id,
			target_id,
			route.rank,
			route.metadata.as_ref(),
		)
		.await?;

		tx.commit().await?;

		Ok(RouteIngested {
			route_id: outcome.route_id,
			prediction_route_id,
			was_reused: outcome.was_reused,
		})
	}

	/// Ingests every route of a run, keyed by external target id. Targets are processed in key
	/// order and the run aggregates are refreshed once at the end.
	pub async fn ingest_run_routes(
		&self,
		run_id: Uuid,
		routes_by_target: &BTreeMap<String, Vec<RouteInput>>,
	) -> Result<IngestSummary> {
		let run = self.get_run_row(run_id).await?;
		let mut summary = IngestSummary::default();

		for (external_target_id, routes) in routes_by_target {
			let target = match self.find_target(run.benchmark_id, external_target_id).await {
				Ok(target) => target,
				Err(err) if err.is_item_error() => {
					for route in routes {
						summary.record_failure(external_target_id, Some(route.rank), &err);
					}

					continue;
				},
				Err(err) => return Err(err),
			};

			for route in routes {
				match self.ingest_route(run_id, target.target_id, route).await {
					Ok(ingested) => {
						if ingested.was_reused {
							summary.routes_reused += 1;
						} else {
							summary.routes_created += 1;
						}

						summary.predictions_linked += 1;
					},
					Err(err) if err.is_item_error() =>
						summary.record_failure(external_target_id, Some(route.rank), &err),
					Err(err) => return Err(err),
				}
			}
		}

		self.refresh_run_aggregates(run_id).await?;

		tracing::info!(
			run_id = %run_id,
			created = summary.routes_created,
			reused = summary.routes_reused,
			linked = summary.predictions_linked,
			failed = summary.failed,
			"Finished route ingestion batch."
		);

		Ok(summary)
	}
}
