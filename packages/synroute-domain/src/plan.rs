//! Flattening of a recursive route into an arena of node descriptors.
//!
//! Each node gets a temporary id equal to its index in [`RoutePlan::nodes`]; parent links are
//! temporary ids until the store assigns real ones. [`RoutePlan::levels`] yields the nodes in
//! parent-before-child order so every row can reference an already persisted parent.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use synroute_config::Ingest;

use crate::{
	PlanError,
	identity::{self, MoleculeIdentity},
	route::MoleculeNode,
};

#[derive(Clone, Debug, PartialEq)]
pub struct NodePlan {
	pub temp_id: usize,
	pub parent: Option<usize>,
	/// Index among the parent's reactants.
	pub position: u32,
	/// Reaction steps between the root and this node.
	pub depth: u32,
	pub smiles: String,
	pub inchikey: String,
	pub is_leaf: bool,
	pub reaction_hash: Option<String>,
	pub step_metadata: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoutePlan {
	pub nodes: Vec<NodePlan>,
	/// Longest root-to-leaf path in reaction steps.
	pub length: u32,
	/// Any reaction step with more than one reactant subtree.
	pub is_convergent: bool,
}
impl RoutePlan {
	pub fn from_tree(root: &MoleculeNode, limits: &Ingest) -> Result<Self, PlanError> {
		let mut nodes: Vec<NodePlan> = Vec::new();
		let mut length = 0;
		let mut is_convergent = false;
		let mut stack = vec![(root, None, 0_u32, 0_u32, "target".to_string())];

		while let Some((node, parent, position, depth, path)) = stack.pop() {
			identity::check_identity(
				&path,
				&node.smiles,
				&node.inchikey,
				limits.require_standard_inchikey,
			)?;

			if depth > limits.max_route_depth {
				return Err(PlanError::TooDeep { max: limits.max_route_depth });
			}
			if nodes.len() >= limits.max_route_nodes as usize {
				return Err(PlanError::TooManyNodes { max: limits.max_route_nodes });
			}

			let reactants = node.reactants();
			let is_leaf = reactants.is_empty();

			if node.is_leaf == Some(true) && !is_leaf {
				return Err(PlanError::ContradictoryLeafFlag { path });
			}

			let temp_id = nodes.len();
			let smiles = node.smiles.trim().to_string();
			let (reaction_hash, step_metadata) = match node.synthesis_step.as_ref() {
				Some(step) if !is_leaf => (
					Some(identity::reaction_hash(
						&smiles,
						reactants.iter().map(|reactant| reactant.smiles.trim()),
					)),
					step.metadata_json(),
				),
				_ => (None, Value::Object(Map::new())),
			};

			length = length.max(depth);
			is_convergent |= reactants.len() > 1;

			nodes.push(NodePlan {
				temp_id,
				parent,
				position,
				depth,
				smiles,
				inchikey: node.inchikey.trim().to_string(),
				is_leaf,
				reaction_hash,
				step_metadata,
			});

			// Reverse so reactants are visited, and numbered, in input order.
			for (idx, reactant) in reactants.iter().enumerate().rev() {
				stack.push((
					reactant,
					Some(temp_id),
					idx as u32,
					depth + 1,
					format!("{path}.synthesis_step.reactants[{idx}]"),
				));
			}
		}

		Ok(Self { nodes, length, is_convergent })
	}

	/// Distinct molecules referenced by the plan, keyed by identity. The first display form
	/// seen for a key wins.
	pub fn molecules(&self) -> Vec<MoleculeIdentity> {
		let mut seen = HashSet::new();
		let mut out = Vec::new();

		for node in &self.nodes {
			if seen.insert(node.inchikey.as_str()) {
				out.push(MoleculeIdentity {
					smiles: node.smiles.clone(),
					inchikey: node.inchikey.clone(),
				});
			}
		}

		out
	}

	/// Node indexes grouped into frontiers: the root first, then each frontier's children.
	pub fn levels(&self) -> Result<Vec<Vec<usize>>, PlanError> {
		let mut ids = HashSet::with_capacity(self.nodes.len());
		let mut roots = Vec::new();
		let mut children: HashMap<usize, Vec<usize>> = HashMap::new();

		for (idx, node) in self.nodes.iter().enumerate() {
			if !ids.insert(node.temp_id) {
				return Err(PlanError::DuplicateNode { temp_id: node.temp_id });
			}

			match node.parent {
				None => roots.push(idx),
				Some(parent) => children.entry(parent).or_default().push(idx),
			}
		}

		match roots.len() {
			0 => return Err(PlanError::NoRoot),
			1 => {},
			count => return Err(PlanError::MultipleRoots { count }),
		}

		let mut levels = Vec::new();
		let mut frontier = roots;
		let mut visited = 0;

		while !frontier.is_empty() {
			let mut next = Vec::new();

			for &idx in &frontier {
				if let Some(kids) = children.remove(&self.nodes[idx].temp_id) {
					next.extend(kids);
				}
			}

			visited += frontier.len();

			levels.push(frontier);

			frontier = next;
		}

		if visited != self.nodes.len() {
			return Err(PlanError::Unreachable { count: self.nodes.len() - visited });
		}

		Ok(levels)
	}

	pub fn root(&self) -> Result<&NodePlan, PlanError> {
		let mut roots = self.nodes.iter().filter(|node| node.parent.is_none());
		let root = roots.next().ok_or(PlanError::NoRoot)?;
		let extra = roots.count();

		if extra > 0 {
			return Err(PlanError::MultipleRoots { count: extra + 1 });
		}

		Ok(root)
	}
}
