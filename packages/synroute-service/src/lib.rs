//! Route ingestion and deduplication over Postgres.
//!
//! A predicted route flows through [`RouteService::ingest_route`]: the tree is flattened into a
//! [`RoutePlan`](synroute_domain::plan::RoutePlan), deduplicated by signature, materialized when
//! new, then linked to the run and target that predicted it. Solvability and run statistics
//! hang off those links.

pub mod admin;
pub mod catalog;
pub mod evaluations;
pub mod ingest;
pub mod linkage;
pub mod materialize;
pub mod molecules;
pub mod routes;
pub mod solvability;
pub mod statistics;
pub mod views;

mod error;
mod time_serde;

pub use admin::ClearReport;
pub use catalog::{TargetInput, TargetSummary};
pub use error::{Error, Result};
pub use evaluations::EvaluationSummary;
pub use ingest::{IngestFailure, IngestSummary, RouteIngested};
pub use materialize::MaterializedRoot;
pub use routes::RouteOutcome;
pub use statistics::RunAggregates;
pub use views::{PredictionSummary, RouteTree, RouteView, RunView, SolvabilityView};

use synroute_config::Config;
use synroute_storage::db::Db;

pub struct RouteService {
	pub cfg: Config,
	pub db: Db,
}
impl RouteService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db }
	}

	pub(crate) fn node_batch_size(&self) -> usize {
		self.cfg.ingest.node_insert_batch_size as usize
	}
}

pub(crate) fn rank_to_db(rank: u32) -> Result<i32> {
	if rank == 0 {
		return Err(Error::invalid("rank must be 1 or greater."));
	}

	i32::try_from(rank).map_err(|_| Error::invalid(format!("rank {rank} is out of range.")))
}
