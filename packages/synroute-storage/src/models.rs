use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Molecule {
	pub molecule_id: Uuid,
	pub smiles: String,
	pub inchikey: String,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Stock {
	pub stock_id: Uuid,
	pub name: String,
	pub description: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Benchmark {
	pub benchmark_id: Uuid,
	pub name: String,
	pub stock_id: Option<Uuid>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BenchmarkTarget {
	pub target_id: Uuid,
	pub benchmark_id: Uuid,
	pub external_target_id: String,
	pub molecule_id: Uuid,
	pub route_length: Option<i32>,
	pub is_convergent: Option<bool>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Model {
	pub model_id: Uuid,
	pub name: String,
	pub version: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PredictionRun {
	pub run_id: Uuid,
	pub model_id: Uuid,
	pub benchmark_id: Uuid,
	pub total_routes: i32,
	pub avg_route_length: Option<f64>,
	pub run_metadata: Value,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Route {
	pub route_id: Uuid,
	pub signature: String,
	pub content_hash: String,
	pub length: i32,
	pub is_convergent: bool,
	pub created_at: OffsetDateTime,
}

/// A node row prepared for insertion. `parent_node_id` must already exist in the same route.
#[derive(Debug, Clone)]
pub struct NewRouteNode {
	pub node_id: Uuid,
	pub route_id: Uuid,
	pub molecule_id: Uuid,
	pub parent_node_id: Option<Uuid>,
	pub position: i32,
	pub is_leaf: bool,
	pub reaction_hash: Option<String>,
	pub step_metadata: Value,
}

/// A stored node joined with its molecule.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RouteNodeRow {
	pub node_id: Uuid,
	pub route_id: Uuid,
	pub molecule_id: Uuid,
	pub parent_node_id: Option<Uuid>,
	pub position: i32,
	pub is_leaf: bool,
	pub reaction_hash: Option<String>,
	pub step_metadata: Value,
	pub smiles: String,
	pub inchikey: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PredictionRoute {
	pub prediction_route_id: Uuid,
	pub route_id: Uuid,
	pub run_id: Uuid,
	pub target_id: Uuid,
	pub rank: i32,
	pub prediction_metadata: Value,
	pub created_at: OffsetDateTime,
}

/// A prediction joined with the shape of its route.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PredictionListing {
	pub prediction_route_id: Uuid,
	pub route_id: Uuid,
	pub rank: i32,
	pub length: i32,
	pub is_convergent: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RouteSolvability {
	pub solvability_id: Uuid,
	pub prediction_route_id: Uuid,
	pub stock_id: Uuid,
	pub is_solvable: bool,
	pub matches_acceptable: bool,
	pub matched_acceptable_index: Option<i32>,
	pub evaluated_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ModelRunStatistics {
	pub statistics_id: Uuid,
	pub run_id: Uuid,
	pub benchmark_id: Uuid,
	pub stock_id: Uuid,
	pub statistics_json: Value,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MetricGroup {
	pub metric_name: String,
	pub group_key: Option<String>,
	pub value: f64,
	pub ci_lower: f64,
	pub ci_upper: f64,
	pub n_samples: i32,
	pub reliability_code: String,
	pub reliability_message: String,
}
