pub mod error;
pub mod input;

use std::{
	collections::BTreeMap,
	path::{Path, PathBuf},
};

use clap::{Args as ClapArgs, Parser, Subcommand};
use color_eyre::eyre;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use synroute_config::Config;
use synroute_domain::{
	metrics::EvaluatorStatistics,
	route::{EvaluationOutcome, RouteInput},
};
use synroute_service::{RouteService, TargetInput};
use synroute_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = synroute_cli::VERSION,
	rename_all = "kebab",
	styles = synroute_cli::styles(),
)]
pub struct Args {
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Load a run's predicted routes: `{ external_target_id: [route, ...] }`.
	Routes {
		#[command(flatten)]
		common: Common,
		#[command(flatten)]
		run: RunArgs,
		#[arg(long, value_name = "FILE")]
		file: PathBuf,
		/// Delete the run's existing predictions before loading.
		#[arg(long)]
		clear_existing: bool,
	},
	/// Load per-route evaluation outcomes against one stock.
	Evaluations {
		#[command(flatten)]
		common: Common,
		#[command(flatten)]
		run: RunArgs,
		#[arg(long, value_name = "NAME")]
		stock: String,
		#[arg(long, value_name = "FILE")]
		file: PathBuf,
	},
	/// Replace a run's statistics for one stock.
	Statistics {
		#[command(flatten)]
		common: Common,
		#[command(flatten)]
		run: RunArgs,
		#[arg(long, value_name = "NAME")]
		stock: String,
		#[arg(long, value_name = "FILE")]
		file: PathBuf,
	},
	/// Register a benchmark's targets: `{ external_target_id: { smiles, inchikey, ... } }`.
	Targets {
		#[command(flatten)]
		common: Common,
		#[arg(long, value_name = "NAME")]
		benchmark: String,
		#[arg(long, value_name = "NAME")]
		stock: Option<String>,
		#[arg(long, value_name = "FILE")]
		file: PathBuf,
	},
	/// Delete a run's predictions so the load can be retried.
	Clear {
		#[command(flatten)]
		common: Common,
		#[command(flatten)]
		run: RunArgs,
	},
	/// Delete routes no run links to.
	Prune {
		#[command(flatten)]
		common: Common,
	},
}

#[derive(Debug, ClapArgs)]
pub struct Common {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

#[derive(Debug, ClapArgs)]
pub struct RunArgs {
	#[arg(long, value_name = "NAME")]
	pub model: String,
	#[arg(long, value_name = "NAME")]
	pub benchmark: String,
}

impl Command {
	fn common(&self) -> &Common {
		match self {
			Self::Routes { common, .. }
			| Self::Evaluations { common, .. }
			| Self::Statistics { common, .. }
			| Self::Targets { common, .. }
			| Self::Clear { common, .. }
			| Self::Prune { common } => common,
		}
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = synroute_config::load(&args.command.common().config)?;

	init_tracing(&config);

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let service = RouteService::new(config, db);
	let failed = match args.command {
		Command::Routes { run, file, clear_existing, .. } =>
			load_routes(&service, &run, &file, clear_existing).await?,
		Command::Evaluations { run, stock, file, .. } =>
			load_evaluations(&service, &run, &stock, &file).await?,
		Command::Statistics { run, stock, file, .. } =>
			load_statistics(&service, &run, &stock, &file).await?,
		Command::Targets { benchmark, stock, file, .. } =>
			load_targets(&service, &benchmark, stock.as_deref(), &file).await?,
		Command::Clear { run, .. } => {
			let found = service.find_run(&run.model, &run.benchmark).await?;

			print_json(&service.clear_run_predictions(found.run_id).await?)?;

			0
		},
		Command::Prune { .. } => {
			let deleted = service.prune_orphan_routes().await?;

			print_json(&serde_json::json!({ "routes_deleted": deleted }))?;

			0
		},
	};

	if failed > 0 {
		return Err(eyre::eyre!("{failed} item(s) failed to load."));
	}

	Ok(())
}

async fn load_routes(
	service: &RouteService,
	run: &RunArgs,
	file: &Path,
	clear_existing: bool,
) -> color_eyre::Result<u64> {
	let routes: BTreeMap<String, Vec<RouteInput>> = input::read_json(file)?;
	let found = service.upsert_run(&run.model, &run.benchmark, None).await?;

	if clear_existing {
		let report = service.clear_run_predictions(found.run_id).await?;

		tracing::info!(
			run_id = %found.run_id,
			predictions_deleted = report.predictions_deleted,
			"Cleared existing predictions before loading."
		);
	}

	let summary = service.ingest_run_routes(found.run_id, &routes).await?;

	print_json(&summary)?;

	Ok(summary.failed)
}

async fn load_evaluations(
	service: &RouteService,
	run: &RunArgs,
	stock: &str,
	file: &Path,
) -> color_eyre::Result<u64> {
	let outcomes: BTreeMap<String, Vec<EvaluationOutcome>> = input::read_json(file)?;
	let found = service.find_run(&run.model, &run.benchmark).await?;
	let summary = service.ingest_evaluations(found.run_id, stock, &outcomes).await?;

	print_json(&summary)?;

	Ok(summary.failed)
}

async fn load_statistics(
	service: &RouteService,
	run: &RunArgs,
	stock: &str,
	file: &Path,
) -> color_eyre::Result<u64> {
	let statistics: EvaluatorStatistics = input::read_json(file)?;
	let found = service.find_run(&run.model, &run.benchmark).await?;
	let stock = service.find_stock_by_name(stock).await?;
	let statistics_id = service
		.record_run_statistics(found.run_id, found.benchmark_id, stock.stock_id, statistics)
		.await?;

	print_json(&serde_json::json!({
		"run_id": found.run_id,
		"stock_id": stock.stock_id,
		"statistics_id": statistics_id,
	}))?;

	Ok(0)
}

async fn load_targets(
	service: &RouteService,
	benchmark: &str,
	stock: Option<&str>,
	file: &Path,
) -> color_eyre::Result<u64> {
	let targets: BTreeMap<String, TargetInput> = input::read_json(file)?;
	let summary = service.register_targets(benchmark, stock, &targets).await?;

	print_json(&summary)?;

	Ok(summary.failed)
}

fn print_json<T>(value: &T) -> color_eyre::Result<()>
where
	T: Serialize,
{
	println!("{}", serde_json::to_string_pretty(value)?);

	Ok(())
}

fn init_tracing(config: &Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_writer(std::io::stderr).with_env_filter(filter).init();
}
