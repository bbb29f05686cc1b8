#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
	#[error("{path}.inchikey is required.")]
	MissingIdentityKey { path: String },
	#[error("{path}.smiles is required.")]
	MissingStructure { path: String },
	#[error("{path}.inchikey is not a standard InChIKey: {key:?}.")]
	InvalidIdentityKey { path: String, key: String },
	#[error("{path} is marked as a leaf but its synthesis step has reactants.")]
	ContradictoryLeafFlag { path: String },
	#[error("Route is deeper than {max} reaction steps.")]
	TooDeep { max: u32 },
	#[error("Route has more than {max} nodes.")]
	TooManyNodes { max: u32 },
	#[error("Route has no root node.")]
	NoRoot,
	#[error("Route has {count} root nodes; exactly one is required.")]
	MultipleRoots { count: usize },
	#[error("Route node id {temp_id} appears more than once.")]
	DuplicateNode { temp_id: usize },
	#[error("{count} route nodes are not reachable from the root.")]
	Unreachable { count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricsError {
	#[error("Metric {metric} has no overall row.")]
	MissingOverall { metric: String },
	#[error("Unknown metric name {name:?}.")]
	UnknownMetric { name: String },
}
