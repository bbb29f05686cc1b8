use std::{
	collections::{HashMap, VecDeque},
	hash::Hash,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::PlanError;

/// A stored route node joined with its molecule, linked to its parent by id.
#[derive(Clone, Debug)]
pub struct FlatNode<K> {
	pub id: K,
	pub parent: Option<K>,
	pub position: i32,
	pub smiles: String,
	pub inchikey: String,
	pub is_leaf: bool,
	pub reaction_hash: Option<String>,
	pub step_metadata: Value,
}

/// Nested display form of a route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
	pub smiles: String,
	pub inchikey: String,
	pub is_leaf: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reaction_hash: Option<String>,
	pub step_metadata: Value,
	#[serde(default)]
	pub children: Vec<TreeNode>,
}
impl TreeNode {
	pub fn node_count(&self) -> usize {
		let mut count = 0;
		let mut stack = vec![self];

		while let Some(node) = stack.pop() {
			count += 1;

			stack.extend(node.children.iter());
		}

		count
	}
}

/// Rebuilds the nested tree from parent pointers. Siblings are ordered by `position`.
pub fn build_tree<K>(nodes: Vec<FlatNode<K>>) -> Result<TreeNode, PlanError>
where
	K: Copy + Eq + Hash,
{
	let mut roots = Vec::new();
	let mut children: HashMap<K, Vec<usize>> = HashMap::new();

	for (idx, node) in nodes.iter().enumerate() {
		match node.parent {
			None => roots.push(idx),
			Some(parent) => children.entry(parent).or_default().push(idx),
		}
	}

	let root = match roots.as_slice() {
		[] => return Err(PlanError::NoRoot),
		[root] => *root,
		_ => return Err(PlanError::MultipleRoots { count: roots.len() }),
	};

	for kids in children.values_mut() {
		kids.sort_by_key(|&idx| nodes[idx].position);
	}

	let mut order = Vec::with_capacity(nodes.len());
	let mut queue = VecDeque::from([root]);

	while let Some(idx) = queue.pop_front() {
		order.push(idx);

		if let Some(kids) = children.get(&nodes[idx].id) {
			queue.extend(kids.iter().copied());
		}
	}

	if order.len() != nodes.len() {
		return Err(PlanError::Unreachable { count: nodes.len() - order.len() });
	}

	let mut slots = nodes.into_iter().map(Some).collect::<Vec<_>>();
	let mut built: Vec<Option<TreeNode>> = (0..slots.len()).map(|_| None).collect();

	// Children precede parents in reverse breadth-first order.
	for &idx in order.iter().rev() {
		let Some(flat) = slots[idx].take() else {
			continue;
		};
		let kids = children
			.get(&flat.id)
			.map(|kids| kids.iter().filter_map(|&kid| built[kid].take()).collect())
			.unwrap_or_default();

		built[idx] = Some(TreeNode {
			smiles: flat.smiles,
			inchikey: flat.inchikey,
			is_leaf: flat.is_leaf,
			reaction_hash: flat.reaction_hash,
			step_metadata: flat.step_metadata,
			children: kids,
		});
	}

	built[root].take().ok_or(PlanError::NoRoot)
}
