use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::PlanError;

const STANDARD_INCHIKEY_PATTERN: &str = r"^[A-Z]{14}-[A-Z]{10}-[A-Z]$";

/// A chemical structure as seen by the identity store: display form plus canonical key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoleculeIdentity {
	pub smiles: String,
	pub inchikey: String,
}

pub fn is_standard_inchikey(key: &str) -> bool {
	Regex::new(STANDARD_INCHIKEY_PATTERN).map(|re| re.is_match(key)).unwrap_or(false)
}

pub fn check_identity(
	path: &str,
	smiles: &str,
	inchikey: &str,
	require_standard_inchikey: bool,
) -> Result<(), PlanError> {
	let inchikey = inchikey.trim();

	if inchikey.is_empty() {
		return Err(PlanError::MissingIdentityKey { path: path.to_string() });
	}
	if smiles.trim().is_empty() {
		return Err(PlanError::MissingStructure { path: path.to_string() });
	}
	if require_standard_inchikey && !is_standard_inchikey(inchikey) {
		return Err(PlanError::InvalidIdentityKey {
			path: path.to_string(),
			key: inchikey.to_string(),
		});
	}

	Ok(())
}

/// Digest of one reaction step: the product and its reactants, independent of reactant order.
pub fn reaction_hash<'a, I>(product_smiles: &str, reactant_smiles: I) -> String
where
	I: IntoIterator<Item = &'a str>,
{
	let mut reactants = reactant_smiles.into_iter().collect::<Vec<_>>();

	reactants.sort_unstable();

	let canonical = format!("{product_smiles}>>{}", reactants.join("."));

	blake3::hash(canonical.as_bytes()).to_hex().to_string()
}
