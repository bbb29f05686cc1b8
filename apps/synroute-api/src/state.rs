use std::sync::Arc;

use synroute_service::RouteService;
use synroute_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<RouteService>,
}
impl AppState {
	pub async fn new(config: synroute_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self { service: Arc::new(RouteService::new(config, db)) })
	}
}
