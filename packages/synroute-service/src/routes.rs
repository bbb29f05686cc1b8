//! Route deduplication gate. A signature maps to exactly one stored route; only the first
//! writer of a signature materializes its tree.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{Error, Result, RouteService, materialize};
use synroute_domain::{plan::RoutePlan, route::MoleculeNode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteOutcome {
	pub route_id: Uuid,
	pub was_reused: bool,
	pub length: i32,
	pub is_convergent: bool,
}

impl RouteService {
	pub async fn get_or_create_route(
		&self,
		signature: &str,
		content_hash: &str,
		root: &MoleculeNode,
	) -> Result<RouteOutcome> {
		let plan = RoutePlan::from_tree(root, &self.cfg.ingest)?;
		let mut tx = self.db.pool.begin().await?;
		let outcome =
			get_or_create_route_tx(&mut tx, signature, content_hash, &plan, self.node_batch_size())
				.await?;

		tx.commit().await?;

		Ok(outcome)
	}
}

pub(crate) async fn get_or_create_route_tx(
	conn: &mut PgConnection,
	signature: &str,
	content_hash: &str,
	plan: &RoutePlan,
	batch_size: usize,
) -> Result<RouteOutcome> {
	if signature.trim().is_empty() {
		return Err(Error::invalid("signature is required."));
	}

	if let Some(route) = synroute_storage::routes::find_route_by_signature(conn, signature).await? {
		tracing::debug!(
			signature = signature_prefix(signature),
			route_id = %route.route_id,
			"Reusing stored route."
		);

		return Ok(RouteOutcome {
			route_id: route.route_id,
			was_reused: true,
			length: route.length,
			is_convergent: route.is_convergent,
		});
	}

	let length = i32::try_from(plan.length)
		.map_err(|_| Error::MalformedTree { message: "Route is too long.".to_string() })?;
	let inserted = synroute_storage::routes::insert_route(
		conn,
		Uuid::new_v4(),
		signature,
		content_hash,
		length,
		plan.is_convergent,
	)
	.await?;
	let Some(route) = inserted else {
		// Another load committed the same signature after the lookup above.
		let route = synroute_storage::routes::find_route_by_signature(conn, signature)
			.await?
			.ok_or_else(|| Error::Conflict {
				message: format!("Route signature {} vanished after a conflict.", signature),
			})?;

		return Ok(RouteOutcome {
			route_id: route.route_id,
			was_reused: true,
			length: route.length,
			is_convergent: route.is_convergent,
		});
	};
	let root = materialize::materialize(conn, plan, route.route_id, batch_size).await?;

	tracing::debug!(
		signature = signature_prefix(signature),
		route_id = %route.route_id,
		root_node_id = %root.root_node_id,
		nodes = plan.nodes.len(),
		"Materialized new route."
	);

	Ok(RouteOutcome {
		route_id: route.route_id,
		was_reused: false,
		length: route.length,
		is_convergent: route.is_convergent,
	})
}

fn signature_prefix(signature: &str) -> &str {
	signature.char_indices().nth(16).map(|(idx, _)| &signature[..idx]).unwrap_or(signature)
}
