//! Route tree materializer: writes a planned tree as node rows, one tree level at a time, so
//! every parent row exists before the rows that reference it.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{Error, Result, molecules};
use synroute_domain::plan::RoutePlan;
use synroute_storage::models::NewRouteNode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaterializedRoot {
	pub root_node_id: Uuid,
	pub root_molecule_id: Uuid,
}

/// Writes every node of `plan` under `route_id`. Runs inside the caller's transaction; any error
/// leaves nothing behind once that transaction rolls back.
pub(crate) async fn materialize(
	conn: &mut PgConnection,
	plan: &RoutePlan,
	route_id: Uuid,
	batch_size: usize,
) -> Result<MaterializedRoot> {
	let levels = plan.levels()?;
	let molecule_ids = molecules::resolve_or_create(conn, &plan.molecules()).await?;
	let mut real_ids: Vec<Option<Uuid>> = vec![None; plan.nodes.len()];
	let mut root = None;

	for level in levels {
		let mut rows = Vec::with_capacity(level.len());

		for idx in level {
			let node = &plan.nodes[idx];
			let molecule_id = *molecule_ids.get(&node.inchikey).ok_or_else(|| Error::Conflict {
				message: format!("Molecule {} was not resolved.", node.inchikey),
			})?;
			let parent_node_id = match node.parent {
				None => None,
				Some(parent) => Some(real_ids.get(parent).copied().flatten().ok_or_else(|| {
					Error::MalformedTree {
						message: format!("Node {} references an unwritten parent.", node.temp_id),
					}
				})?),
			};
			let node_id = Uuid::new_v4();

			real_ids[idx] = Some(node_id);

			if parent_node_id.is_none() {
				root = Some(MaterializedRoot { root_node_id: node_id, root_molecule_id: molecule_id });
			}

			rows.push(NewRouteNode {
				node_id,
				route_id,
				molecule_id,
				parent_node_id,
				position: i32::try_from(node.position).map_err(|_| Error::MalformedTree {
					message: format!("Node {} has too many siblings.", node.temp_id),
				})?,
				is_leaf: node.is_leaf,
				reaction_hash: node.reaction_hash.clone(),
				step_metadata: node.step_metadata.clone(),
			});
		}

		synroute_storage::routes::insert_route_nodes(conn, &rows, batch_size).await?;
	}

	root.ok_or_else(|| Error::MalformedTree { message: "Route has no root node.".to_string() })
}
