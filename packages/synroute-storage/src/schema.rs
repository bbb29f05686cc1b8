pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_molecules.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_molecules.sql")),
				"tables/002_stocks.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_stocks.sql")),
				"tables/003_benchmarks.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_benchmarks.sql")),
				"tables/004_benchmark_targets.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_benchmark_targets.sql")),
				"tables/005_models.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_models.sql")),
				"tables/006_prediction_runs.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_prediction_runs.sql")),
				"tables/007_routes.sql" =>
					out.push_str(include_str!("../../../sql/tables/007_routes.sql")),
				"tables/008_route_nodes.sql" =>
					out.push_str(include_str!("../../../sql/tables/008_route_nodes.sql")),
				"tables/009_prediction_routes.sql" =>
					out.push_str(include_str!("../../../sql/tables/009_prediction_routes.sql")),
				"tables/010_route_solvability.sql" =>
					out.push_str(include_str!("../../../sql/tables/010_route_solvability.sql")),
				"tables/011_model_run_statistics.sql" =>
					out.push_str(include_str!("../../../sql/tables/011_model_run_statistics.sql")),
				"tables/012_stratified_metric_groups.sql" => out
					.push_str(include_str!("../../../sql/tables/012_stratified_metric_groups.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
