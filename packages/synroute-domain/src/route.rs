//! Route exports as emitted by a prediction engine: one [`RouteInput`] per target and rank,
//! holding a recursive molecule/reaction tree.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteInput {
	pub target: MoleculeNode,
	pub rank: u32,
	pub content_hash: String,
	pub signature: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoleculeNode {
	pub smiles: String,
	pub inchikey: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub synthesis_step: Option<ReactionStep>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub is_leaf: Option<bool>,
}
impl MoleculeNode {
	pub fn leaf(smiles: impl Into<String>, inchikey: impl Into<String>) -> Self {
		Self { smiles: smiles.into(), inchikey: inchikey.into(), synthesis_step: None, is_leaf: None }
	}

	pub fn product(
		smiles: impl Into<String>,
		inchikey: impl Into<String>,
		reactants: Vec<MoleculeNode>,
	) -> Self {
		Self {
			smiles: smiles.into(),
			inchikey: inchikey.into(),
			synthesis_step: Some(ReactionStep { reactants, ..Default::default() }),
			is_leaf: None,
		}
	}

	/// Reactant subtrees of this node's synthesis step. Empty for leaves.
	pub fn reactants(&self) -> &[MoleculeNode] {
		self.synthesis_step.as_ref().map(|step| step.reactants.as_slice()).unwrap_or_default()
	}
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReactionStep {
	#[serde(default)]
	pub reactants: Vec<MoleculeNode>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub template: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reagents: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub solvents: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mapped_smiles: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Value>,
}
impl ReactionStep {
	/// Step annotations stored on the product node. Absent fields are omitted.
	pub fn metadata_json(&self) -> Value {
		let mut out = Map::new();

		if let Some(template) = self.template.as_ref() {
			out.insert("template".to_string(), Value::String(template.clone()));
		}
		if let Some(reagents) = self.reagents.as_ref() {
			out.insert("reagents".to_string(), string_array(reagents));
		}
		if let Some(solvents) = self.solvents.as_ref() {
			out.insert("solvents".to_string(), string_array(solvents));
		}
		if let Some(mapped_smiles) = self.mapped_smiles.as_ref() {
			out.insert("mapped_smiles".to_string(), Value::String(mapped_smiles.clone()));
		}
		if let Some(metadata) = self.metadata.as_ref() {
			out.insert("metadata".to_string(), metadata.clone());
		}

		Value::Object(out)
	}
}

/// Outcome of evaluating one predicted route against one stock.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluationOutcome {
	pub rank: u32,
	pub is_solved: bool,
	pub matches_acceptable: bool,
	#[serde(default)]
	pub matched_acceptable_index: Option<u32>,
}

fn string_array(values: &[String]) -> Value {
	Value::Array(values.iter().cloned().map(Value::String).collect())
}
