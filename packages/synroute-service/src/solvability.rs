use uuid::Uuid;

use crate::{Error, Result, RouteService};
use synroute_storage::{catalog, predictions};

impl RouteService {
	/// Records whether a predicted route is solvable against a stock. Re-evaluation overwrites
	/// the earlier outcome.
	pub async fn record_solvability(
		&self,
		prediction_route_id: Uuid,
		stock_id: Uuid,
		is_solvable: bool,
		matches_acceptable: bool,
		matched_acceptable_index: Option<u32>,
	) -> Result<Uuid> {
		let mut conn = self.db.pool.acquire().await?;

		record_tx(
			&mut conn,
			prediction_route_id,
			stock_id,
			is_solvable,
			matches_acceptable,
			matched_acceptable_index,
		)
		.await
	}
}

pub(crate) async fn record_tx(
	conn: &mut sqlx::PgConnection,
	prediction_route_id: Uuid,
	stock_id: Uuid,
	is_solvable: bool,
	matches_acceptable: bool,
	matched_acceptable_index: Option<u32>,
) -> Result<Uuid> {
	let matched_acceptable_index = matched_acceptable_index
		.map(|idx| {
			i32::try_from(idx).map_err(|_| {
				Error::invalid(format!("matched_acceptable_index {idx} is out of range."))
			})
		})
		.transpose()?;

	if matched_acceptable_index.is_some() && !matches_acceptable {
		return Err(Error::invalid(
			"matched_acceptable_index requires matches_acceptable to be true.",
		));
	}
	if predictions::get_prediction_route(conn, prediction_route_id).await?.is_none() {
		return Err(Error::not_found(format!(
			"Prediction {prediction_route_id} does not exist."
		)));
	}
	if catalog::get_stock(conn, stock_id).await?.is_none() {
		return Err(Error::not_found(format!("Stock {stock_id} does not exist.")));
	}

	let row = synroute_storage::solvability::upsert_route_solvability(
		conn,
		prediction_route_id,
		stock_id,
		is_solvable,
		matches_acceptable,
		matched_acceptable_index,
	)
	.await?;

	Ok(row.solvability_id)
}
