//! Stocks, benchmarks, targets, models and runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, IngestFailure, Result, RouteService};
use synroute_domain::identity;
use synroute_storage::{
	catalog, molecules,
	models::{Benchmark, BenchmarkTarget, Model, PredictionRun, Stock},
};

/// One benchmark target as listed in a benchmark definition file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TargetInput {
	pub smiles: String,
	pub inchikey: String,
	/// Length of the reference route, when the benchmark ships one.
	#[serde(default)]
	pub route_length: Option<u32>,
	#[serde(default)]
	pub is_convergent: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSummary {
	pub registered: u64,
	pub failed: u64,
	pub failures: Vec<IngestFailure>,
}

impl RouteService {
	pub async fn ensure_stock(&self, name: &str, description: Option<&str>) -> Result<Stock> {
		let mut conn = self.db.pool.acquire().await?;

		Ok(catalog::ensure_stock(&mut conn, name, description).await?)
	}

	pub async fn find_stock_by_name(&self, name: &str) -> Result<Stock> {
		let mut conn = self.db.pool.acquire().await?;

		catalog::find_stock_by_name(&mut conn, name)
			.await?
			.ok_or_else(|| Error::not_found(format!("Stock {name:?} does not exist.")))
	}

	/// Creates the benchmark, or returns the existing one. A named stock is created on demand
	/// and becomes the benchmark's default stock.
	pub async fn ensure_benchmark(&self, name: &str, stock_name: Option<&str>) -> Result<Benchmark> {
		let mut tx = self.db.pool.begin().await?;
		let stock_id = match stock_name {
			Some(stock_name) => Some(catalog::ensure_stock(&mut tx, stock_name, None).await?.stock_id),
			None => None,
		};
		let benchmark = catalog::ensure_benchmark(&mut tx, name, stock_id).await?;

		tx.commit().await?;

		Ok(benchmark)
	}

	pub async fn find_benchmark_by_name(&self, name: &str) -> Result<Benchmark> {
		let mut conn = self.db.pool.acquire().await?;

		catalog::find_benchmark_by_name(&mut conn, name)
			.await?
			.ok_or_else(|| Error::not_found(format!("Benchmark {name:?} does not exist.")))
	}

	pub async fn ensure_model(&self, name: &str, version: Option<&str>) -> Result<Model> {
		let mut conn = self.db.pool.acquire().await?;

		Ok(catalog::ensure_model(&mut conn, name, version).await?)
	}

	/// Returns the run of `model_name` on `benchmark_name`, creating the model and run when
	/// needed. The benchmark must already exist.
	pub async fn upsert_run(
		&self,
		model_name: &str,
		benchmark_name: &str,
		metadata: Option<&Value>,
	) -> Result<PredictionRun> {
		if metadata.is_some_and(|value| !value.is_object()) {
			return Err(Error::invalid("run metadata must be a JSON object."));
		}

		let mut tx = self.db.pool.begin().await?;
		let benchmark = catalog::find_benchmark_by_name(&mut tx, benchmark_name)
			.await?
			.ok_or_else(|| {
				Error::not_found(format!("Benchmark {benchmark_name:?} does not exist."))
			})?;
		let model = catalog::ensure_model(&mut tx, model_name, None).await?;
		let run =
			catalog::upsert_run(&mut tx, model.model_id, benchmark.benchmark_id, metadata).await?;

		tx.commit().await?;

		Ok(run)
	}

	pub async fn find_run(&self, model_name: &str, benchmark_name: &str) -> Result<PredictionRun> {
		let mut conn = self.db.pool.acquire().await?;
		let model = catalog::find_model_by_name(&mut conn, model_name)
			.await?
			.ok_or_else(|| Error::not_found(format!("Model {model_name:?} does not exist.")))?;
		let benchmark = catalog::find_benchmark_by_name(&mut conn, benchmark_name)
			.await?
			.ok_or_else(|| {
				Error::not_found(format!("Benchmark {benchmark_name:?} does not exist."))
			})?;

		catalog::find_run(&mut conn, model.model_id, benchmark.benchmark_id).await?.ok_or_else(
			|| {
				Error::not_found(format!(
					"Model {model_name:?} has no run on benchmark {benchmark_name:?}."
				))
			},
		)
	}

	pub async fn register_target(
		&self,
		benchmark_id: Uuid,
		external_target_id: &str,
		input: &TargetInput,
	) -> Result<BenchmarkTarget> {
		identity::check_identity(
			external_target_id,
			&input.smiles,
			&input.inchikey,
			self.cfg.ingest.require_standard_inchikey,
		)
		.map_err(|err| Error::invalid(err.to_string()))?;

		let route_length = input
			.route_length
			.map(|len| {
				i32::try_from(len)
					.map_err(|_| Error::invalid(format!("route_length {len} is out of range.")))
			})
			.transpose()?;
		let mut tx = self.db.pool.begin().await?;
		let molecule = molecules::get_or_create_molecule(
			&mut tx,
			input.smiles.trim(),
			input.inchikey.trim(),
		)
		.await?;
		let existing = catalog::find_target(&mut tx, benchmark_id, external_target_id).await?;

		if let Some(existing) = existing.as_ref()
			&& existing.molecule_id != molecule.molecule_id
		{
			return Err(Error::Conflict {
				message: format!(
					"Target {external_target_id} is already registered with a different molecule."
				),
			});
		}

		let target = catalog::upsert_target(
			&mut tx,
			benchmark_id,
			external_target_id,
			molecule.molecule_id,
			route_length,
			input.is_convergent,
		)
		.await?;

		tx.commit().await?;

		Ok(target)
	}

	/// Registers a benchmark's targets. Bad entries are reported and skipped.
	pub async fn register_targets(
		&self,
		benchmark_name: &str,
		stock_name: Option<&str>,
		targets: &BTreeMap<String, TargetInput>,
	) -> Result<TargetSummary> {
		let benchmark = self.ensure_benchmark(benchmark_name, stock_name).await?;
		let mut summary = TargetSummary::default();

		for (external_target_id, input) in targets {
			match self.register_target(benchmark.benchmark_id, external_target_id, input).await {
				Ok(_) => summary.registered += 1,
				Err(err) if err.is_item_error() => {
					tracing::warn!(
						external_target_id = external_target_id.as_str(),
						error = %err,
						"Target registration failed."
					);

					summary.failed += 1;
					summary.failures.push(IngestFailure::new(external_target_id, None, &err));
				},
				Err(err) => return Err(err),
			}
		}

		tracing::info!(
			benchmark = benchmark_name,
			registered = summary.registered,
			failed = summary.failed,
			"Registered benchmark targets."
		);

		Ok(summary)
	}

	pub async fn find_target(
		&self,
		benchmark_id: Uuid,
		external_target_id: &str,
	) -> Result<BenchmarkTarget> {
		let mut conn = self.db.pool.acquire().await?;

		catalog::find_target(&mut conn, benchmark_id, external_target_id).await?.ok_or_else(|| {
			Error::not_found(format!(
				"Target {external_target_id} is not registered for benchmark {benchmark_id}."
			))
		})
	}

	pub(crate) async fn get_run_row(&self, run_id: Uuid) -> Result<PredictionRun> {
		let mut conn = self.db.pool.acquire().await?;

		catalog::get_run(&mut conn, run_id)
			.await?
			.ok_or_else(|| Error::not_found(format!("Run {run_id} does not exist.")))
	}
}
