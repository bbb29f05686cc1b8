use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{NewRouteNode, Route, RouteNodeRow},
};

// Eight bind parameters per row. Postgres accepts at most 65535 per statement.
const MAX_NODES_PER_STATEMENT: usize = 8_000;
// Held shared by transactions that link to stored routes, exclusively by orphan pruning.
const ROUTE_LINK_LOCK_ID: i64 = 7_120_116;

pub async fn find_route_by_signature(
	executor: &mut PgConnection,
	signature: &str,
) -> Result<Option<Route>> {
	let row = sqlx::query_as::<_, Route>(
		"\
SELECT route_id, signature, content_hash, length, is_convergent, created_at
FROM routes
WHERE signature = $1",
	)
	.bind(signature)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn get_route(executor: &mut PgConnection, route_id: Uuid) -> Result<Option<Route>> {
	let row = sqlx::query_as::<_, Route>(
		"\
SELECT route_id, signature, content_hash, length, is_convergent, created_at
FROM routes
WHERE route_id = $1",
	)
	.bind(route_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

/// Inserts a route header. Returns `None` when another writer already owns `signature`.
pub async fn insert_route(
	executor: &mut PgConnection,
	route_id: Uuid,
	signature: &str,
	content_hash: &str,
	length: i32,
	is_convergent: bool,
) -> Result<Option<Route>> {
	if signature.trim().is_empty() {
		return Err(Error::InvalidArgument("route signature must not be empty".to_string()));
	}
	if length < 0 {
		return Err(Error::InvalidArgument(format!("route length must be >= 0; got {length}")));
	}

	let row = sqlx::query_as::<_, Route>(
		"\
INSERT INTO routes (route_id, signature, content_hash, length, is_convergent, created_at)
VALUES ($1, $2, $3, $4, $5, now())
ON CONFLICT (signature) DO NOTHING
RETURNING route_id, signature, content_hash, length, is_convergent, created_at",
	)
	.bind(route_id)
	.bind(signature)
	.bind(content_hash)
	.bind(length)
	.bind(is_convergent)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

/// Writes node rows with multi-row statements of at most `batch_size` rows. Callers pass rows
/// in parent-before-child order.
pub async fn insert_route_nodes(
	executor: &mut PgConnection,
	nodes: &[NewRouteNode],
	batch_size: usize,
) -> Result<u64> {
	let batch_size = batch_size.clamp(1, MAX_NODES_PER_STATEMENT);
	let mut inserted = 0;

	for chunk in nodes.chunks(batch_size) {
		let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
			"\
INSERT INTO route_nodes (
	node_id,
	route_id,
	molecule_id,
	parent_node_id,
	position,
	is_leaf,
	reaction_hash,
	step_metadata
) ",
		);

		builder.push_values(chunk, |mut row, node| {
			row.push_bind(node.node_id)
				.push_bind(node.route_id)
				.push_bind(node.molecule_id)
				.push_bind(node.parent_node_id)
				.push_bind(node.position)
				.push_bind(node.is_leaf)
				.push_bind(node.reaction_hash.as_deref())
				.push_bind(&node.step_metadata);
		});

		inserted += builder.build().execute(&mut *executor).await?.rows_affected();
	}

	Ok(inserted)
}

pub async fn list_route_nodes(
	executor: &mut PgConnection,
	route_id: Uuid,
) -> Result<Vec<RouteNodeRow>> {
	let rows = sqlx::query_as::<_, RouteNodeRow>(
		"\
SELECT
	n.node_id,
	n.route_id,
	n.molecule_id,
	n.parent_node_id,
	n.position,
	n.is_leaf,
	n.reaction_hash,
	n.step_metadata,
	m.smiles,
	m.inchikey
FROM route_nodes n
JOIN molecules m ON m.molecule_id = n.molecule_id
WHERE n.route_id = $1
ORDER BY n.parent_node_id NULLS FIRST, n.position",
	)
	.bind(route_id)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

pub async fn count_route_nodes(executor: &mut PgConnection, route_id: Uuid) -> Result<i64> {
	let count: i64 = sqlx::query_scalar("SELECT count(*) FROM route_nodes WHERE route_id = $1")
		.bind(route_id)
		.fetch_one(&mut *executor)
		.await?;

	Ok(count)
}

pub async fn count_routes(executor: &mut PgConnection) -> Result<i64> {
	let count: i64 =
		sqlx::query_scalar("SELECT count(*) FROM routes").fetch_one(&mut *executor).await?;

	Ok(count)
}

/// Blocks orphan pruning until the current transaction ends. Concurrent holders do not block
/// each other.
pub async fn lock_routes_for_linking(executor: &mut PgConnection) -> Result<()> {
	sqlx::query("SELECT pg_advisory_xact_lock_shared($1)")
		.bind(ROUTE_LINK_LOCK_ID)
		.execute(&mut *executor)
		.await?;

	Ok(())
}

/// Waits for every transaction holding [`lock_routes_for_linking`] and keeps new ones out until
/// the current transaction ends.
pub async fn lock_routes_for_pruning(executor: &mut PgConnection) -> Result<()> {
	sqlx::query("SELECT pg_advisory_xact_lock($1)")
		.bind(ROUTE_LINK_LOCK_ID)
		.execute(&mut *executor)
		.await?;

	Ok(())
}

/// Deletes routes no prediction links to. Their nodes go with them.
pub async fn delete_orphan_routes(executor: &mut PgConnection) -> Result<u64> {
	let result = sqlx::query(
		"\
DELETE FROM routes r
WHERE NOT EXISTS (
	SELECT 1
	FROM prediction_routes p
	WHERE p.route_id = r.route_id
)",
	)
	.execute(&mut *executor)
	.await?;

	Ok(result.rows_affected())
}
