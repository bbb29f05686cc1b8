//! Run statistics and run aggregates.
//!
//! Evaluator output is stored twice: as a camelCase JSON blob served verbatim, and as one row
//! per metric and bucket. The rows rebuild the blob when it cannot be decoded.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, RouteService};
use synroute_domain::metrics::{
	EvaluatorStatistics, MetricResult, MetricRow, Reliability, RunStatistics,
};
use synroute_storage::{catalog, models::MetricGroup, statistics};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunAggregates {
	pub total_routes: i32,
	pub avg_route_length: Option<f64>,
}

impl RouteService {
	/// Replaces everything stored for `(run_id, stock_id)` with `input`, atomically.
	pub async fn record_run_statistics(
		&self,
		run_id: Uuid,
		benchmark_id: Uuid,
		stock_id: Uuid,
		input: EvaluatorStatistics,
	) -> Result<Uuid> {
		let stats = RunStatistics::from(input);
		let blob = serde_json::to_value(&stats)
			.map_err(|err| Error::invalid(format!("Failed to encode statistics: {err}")))?;
		let groups = stats.to_rows().into_iter().map(to_group).collect::<Result<Vec<_>>>()?;
		let mut tx = self.db.pool.begin().await?;
		let run = catalog::get_run(&mut tx, run_id)
			.await?
			.ok_or_else(|| Error::not_found(format!("Run {run_id} does not exist.")))?;

		if run.benchmark_id != benchmark_id {
			return Err(Error::invalid(format!(
				"Run {run_id} does not belong to benchmark {benchmark_id}."
			)));
		}
		if catalog::get_stock(&mut tx, stock_id).await?.is_none() {
			return Err(Error::not_found(format!("Stock {stock_id} does not exist.")));
		}

		let statistics_id =
			statistics::upsert_run_statistics(&mut tx, run_id, benchmark_id, stock_id, &blob)
				.await?;

		statistics::replace_metric_groups(&mut tx, statistics_id, &groups).await?;

		tx.commit().await?;

		tracing::info!(
			run_id = %run_id,
			stock_id = %stock_id,
			rows = groups.len(),
			"Replaced run statistics."
		);

		Ok(statistics_id)
	}

	pub async fn get_run_statistics(&self, run_id: Uuid, stock_id: Uuid) -> Result<RunStatistics> {
		let mut conn = self.db.pool.acquire().await?;
		let stored = statistics::get_run_statistics(&mut conn, run_id, stock_id)
			.await?
			.ok_or_else(|| {
				Error::not_found(format!("No statistics for run {run_id} and stock {stock_id}."))
			})?;

		match serde_json::from_value::<RunStatistics>(stored.statistics_json) {
			Ok(stats) => Ok(stats),
			Err(err) => {
				tracing::warn!(
					run_id = %run_id,
					stock_id = %stock_id,
					error = %err,
					"Statistics blob is unreadable; rebuilding from metric rows."
				);

				let groups =
					statistics::list_metric_groups(&mut conn, stored.statistics_id).await?;
				let rows = groups.into_iter().map(from_group).collect::<Result<Vec<_>>>()?;

				Ok(RunStatistics::from_rows(rows)?)
			},
		}
	}

	/// Recomputes the run's link count and mean route length from the stored links.
	pub async fn refresh_run_aggregates(&self, run_id: Uuid) -> Result<RunAggregates> {
		let mut conn = self.db.pool.acquire().await?;

		refresh_tx(&mut conn, run_id).await
	}
}

pub(crate) async fn refresh_tx(
	conn: &mut sqlx::PgConnection,
	run_id: Uuid,
) -> Result<RunAggregates> {
	let run = statistics::refresh_run_aggregates(conn, run_id)
		.await?
		.ok_or_else(|| Error::not_found(format!("Run {run_id} does not exist.")))?;

	tracing::info!(
		run_id = %run_id,
		total_routes = run.total_routes,
		avg_route_length = ?run.avg_route_length,
		"Refreshed run aggregates."
	);

	Ok(RunAggregates { total_routes: run.total_routes, avg_route_length: run.avg_route_length })
}

fn to_group(row: MetricRow) -> Result<MetricGroup> {
	let MetricRow { metric_name, group_key, result } = row;
	let n_samples = i32::try_from(result.n_samples)
		.map_err(|_| Error::invalid(format!("{metric_name}.nSamples is out of range.")))?;

	Ok(MetricGroup {
		metric_name,
		group_key,
		value: result.value,
		ci_lower: result.ci_lower,
		ci_upper: result.ci_upper,
		n_samples,
		reliability_code: result.reliability.code,
		reliability_message: result.reliability.message,
	})
}

fn from_group(group: MetricGroup) -> Result<MetricRow> {
	let n_samples = u32::try_from(group.n_samples).map_err(|_| Error::Storage {
		message: format!("Stored n_samples for {} is negative.", group.metric_name),
	})?;

	Ok(MetricRow {
		metric_name: group.metric_name,
		group_key: group.group_key,
		result: MetricResult {
			value: group.value,
			ci_lower: group.ci_lower,
			ci_upper: group.ci_upper,
			n_samples,
			reliability: Reliability {
				code: group.reliability_code,
				message: group.reliability_message,
			},
		},
	})
}
