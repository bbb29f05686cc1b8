//! Molecule identity store: one row per identity key, created on first sight.

use std::collections::{HashMap, HashSet};

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{Error, Result, RouteService};
use synroute_domain::identity::{self, MoleculeIdentity};

impl RouteService {
	/// Resolves every identity to a molecule id, creating the missing ones. Keys are checked
	/// before anything is written.
	pub async fn resolve_molecules(
		&self,
		identities: &[MoleculeIdentity],
	) -> Result<HashMap<String, Uuid>> {
		for (idx, molecule) in identities.iter().enumerate() {
			identity::check_identity(
				&format!("molecules[{idx}]"),
				&molecule.smiles,
				&molecule.inchikey,
				self.cfg.ingest.require_standard_inchikey,
			)
			.map_err(|err| Error::invalid(err.to_string()))?;
		}

		let mut conn = self.db.pool.acquire().await?;

		resolve_or_create(&mut conn, identities).await
	}
}

/// Bulk create-or-reuse. A key seen twice in `identities` keeps its first display form, and a
/// key already stored keeps the stored one.
pub(crate) async fn resolve_or_create(
	conn: &mut PgConnection,
	identities: &[MoleculeIdentity],
) -> Result<HashMap<String, Uuid>> {
	let mut seen = HashSet::with_capacity(identities.len());
	let mut distinct = Vec::with_capacity(identities.len());

	for molecule in identities {
		let inchikey = molecule.inchikey.trim();

		if seen.insert(inchikey) {
			distinct.push((molecule.smiles.trim().to_string(), inchikey.to_string()));
		}
	}

	let resolved = synroute_storage::molecules::resolve_molecules(conn, &distinct).await?;

	tracing::debug!(requested = distinct.len(), "Resolved molecule identities.");

	Ok(resolved)
}
