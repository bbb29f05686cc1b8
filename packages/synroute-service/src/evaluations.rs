use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, IngestFailure, Result, RouteService, solvability};
use synroute_domain::route::EvaluationOutcome;
use synroute_storage::{catalog, predictions};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationSummary {
	pub recorded: u64,
	pub failed: u64,
	pub failures: Vec<IngestFailure>,
}
impl EvaluationSummary {
	fn record_failure(&mut self, external_target_id: &str, rank: Option<u32>, err: &Error) {
		tracing::warn!(
			external_target_id,
			rank = ?rank,
			error = %err,
			"Evaluation outcome was not recorded."
		);

		self.failed += 1;
		self.failures.push(IngestFailure::new(external_target_id, rank, err));
	}
}

impl RouteService {
	/// Records per-route outcomes of a run against the stock named `stock_name`. Outcomes are
	/// matched to predictions by target and rank.
	pub async fn ingest_evaluations(
		&self,
		run_id: Uuid,
		stock_name: &str,
		outcomes_by_target: &BTreeMap<String, Vec<EvaluationOutcome>>,
	) -> Result<EvaluationSummary> {
		let run = self.get_run_row(run_id).await?;
		let stock = self.find_stock_by_name(stock_name).await?;
		let mut summary = EvaluationSummary::default();

		for (external_target_id, outcomes) in outcomes_by_target {
			for outcome in outcomes {
				let result = self
					.record_outcome(
						run.run_id,
						run.benchmark_id,
						stock.stock_id,
						external_target_id,
						outcome,
					)
					.await;

				match result {
					Ok(_) => summary.recorded += 1,
					Err(err) if err.is_item_error() =>
						summary.record_failure(external_target_id, Some(outcome.rank), &err),
					Err(err) => return Err(err),
				}
			}
		}

		tracing::info!(
			run_id = %run_id,
			stock = stock_name,
			recorded = summary.recorded,
			failed = summary.failed,
			"Finished evaluation ingestion batch."
		);

		Ok(summary)
	}

	async fn record_outcome(
		&self,
		run_id: Uuid,
		benchmark_id: Uuid,
		stock_id: Uuid,
		external_target_id: &str,
		outcome: &EvaluationOutcome,
	) -> Result<Uuid> {
		let rank = crate::rank_to_db(outcome.rank)?;
		let mut tx = self.db.pool.begin().await?;
		let target = catalog::find_target(&mut tx, benchmark_id, external_target_id)
			.await?
			.ok_or_else(|| {
				Error::not_found(format!(
					"Target {external_target_id} is not registered for the run's benchmark."
				))
			})?;
		let prediction =
			predictions::find_prediction_by_rank(&mut tx, run_id, target.target_id, rank)
				.await?
				.ok_or_else(|| {
					Error::not_found(format!(
						"Run {run_id} has no prediction at rank {rank} for target {external_target_id}."
					))
				})?;
		let solvability_id = solvability::record_tx(
			&mut tx,
			prediction.prediction_route_id,
			stock_id,
			outcome.is_solved,
			outcome.matches_acceptable,
			outcome.matched_acceptable_index,
		)
		.await?;

		tx.commit().await?;

		Ok(solvability_id)
	}
}
