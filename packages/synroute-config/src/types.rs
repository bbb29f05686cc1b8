use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub ingest: Ingest,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Ingest {
	/// Reject identity keys that are not shaped like a standard InChIKey
	/// (`XXXXXXXXXXXXXX-XXXXXXXXXX-X`).
	pub require_standard_inchikey: bool,
	/// Longest accepted root-to-leaf path, counted in reaction steps.
	pub max_route_depth: u32,
	pub max_route_nodes: u32,
	/// Rows per multi-row `INSERT` when materializing one tree level.
	pub node_insert_batch_size: u32,
}
impl Default for Ingest {
	fn default() -> Self {
		Self {
			require_standard_inchikey: false,
			max_route_depth: 64,
			max_route_nodes: 4_096,
			node_insert_batch_size: 1_000,
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}
