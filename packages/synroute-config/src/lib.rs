mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Ingest, Postgres, Service, Storage};

use std::{fs, path::Path};

// Eight bound columns per route node; Postgres caps a statement at 65_535 parameters.
const MAX_NODE_INSERT_BATCH_SIZE: u32 = 8_000;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.ingest.max_route_depth == 0 {
		return Err(Error::Validation {
			message: "ingest.max_route_depth must be greater than zero.".to_string(),
		});
	}
	if cfg.ingest.max_route_nodes == 0 {
		return Err(Error::Validation {
			message: "ingest.max_route_nodes must be greater than zero.".to_string(),
		});
	}
	if cfg.ingest.max_route_depth >= cfg.ingest.max_route_nodes {
		return Err(Error::Validation {
			message: "ingest.max_route_depth must be less than ingest.max_route_nodes."
				.to_string(),
		});
	}
	if !(1..=MAX_NODE_INSERT_BATCH_SIZE).contains(&cfg.ingest.node_insert_batch_size) {
		return Err(Error::Validation {
			message: format!(
				"ingest.node_insert_batch_size must be in the range 1-{MAX_NODE_INSERT_BATCH_SIZE}."
			),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}

	cfg.storage.postgres.dsn = cfg.storage.postgres.dsn.trim().to_string();
}
