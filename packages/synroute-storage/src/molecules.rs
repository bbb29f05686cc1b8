use std::collections::HashMap;

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{Error, Result, models::Molecule};

pub async fn find_molecule_by_inchikey(
	executor: &mut PgConnection,
	inchikey: &str,
) -> Result<Option<Molecule>> {
	let row = sqlx::query_as::<_, Molecule>(
		"\
SELECT molecule_id, smiles, inchikey, created_at
FROM molecules
WHERE inchikey = $1",
	)
	.bind(inchikey)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn get_molecule(executor: &mut PgConnection, molecule_id: Uuid) -> Result<Molecule> {
	let row = sqlx::query_as::<_, Molecule>(
		"\
SELECT molecule_id, smiles, inchikey, created_at
FROM molecules
WHERE molecule_id = $1",
	)
	.bind(molecule_id)
	.fetch_optional(&mut *executor)
	.await?;

	row.ok_or_else(|| Error::NotFound(format!("molecule not found; molecule_id={molecule_id}")))
}

/// Returns the molecule stored under `inchikey`, creating it first when absent. An existing
/// record keeps its original display form.
pub async fn get_or_create_molecule(
	executor: &mut PgConnection,
	smiles: &str,
	inchikey: &str,
) -> Result<Molecule> {
	sqlx::query(
		"\
INSERT INTO molecules (molecule_id, smiles, inchikey, created_at)
VALUES ($1, $2, $3, now())
ON CONFLICT (inchikey) DO NOTHING",
	)
	.bind(Uuid::new_v4())
	.bind(smiles)
	.bind(inchikey)
	.execute(&mut *executor)
	.await?;

	find_molecule_by_inchikey(executor, inchikey).await?.ok_or_else(|| {
		Error::Conflict(format!("molecule vanished after insert; inchikey={inchikey}"))
	})
}

/// Bulk form of [`get_or_create_molecule`]. Returns molecule ids keyed by identity key.
pub async fn resolve_molecules(
	executor: &mut PgConnection,
	identities: &[(String, String)],
) -> Result<HashMap<String, Uuid>> {
	if identities.is_empty() {
		return Ok(HashMap::new());
	}

	let ids = identities.iter().map(|_| Uuid::new_v4()).collect::<Vec<_>>();
	let smiles = identities.iter().map(|(smiles, _)| smiles.clone()).collect::<Vec<_>>();
	let keys = identities.iter().map(|(_, inchikey)| inchikey.clone()).collect::<Vec<_>>();

	sqlx::query(
		"\
INSERT INTO molecules (molecule_id, smiles, inchikey, created_at)
SELECT molecule_id, smiles, inchikey, now()
FROM UNNEST($1::uuid[], $2::text[], $3::text[]) AS input(molecule_id, smiles, inchikey)
ORDER BY inchikey
ON CONFLICT (inchikey) DO NOTHING",
	)
	.bind(&ids)
	.bind(&smiles)
	.bind(&keys)
	.execute(&mut *executor)
	.await?;

	let rows: Vec<(Uuid, String)> = sqlx::query_as(
		"\
SELECT molecule_id, inchikey
FROM molecules
WHERE inchikey = ANY($1::text[])",
	)
	.bind(&keys)
	.fetch_all(&mut *executor)
	.await?;
	let resolved = rows.into_iter().map(|(id, key)| (key, id)).collect::<HashMap<_, _>>();

	if let Some(missing) = keys.iter().find(|key| !resolved.contains_key(key.as_str())) {
		return Err(Error::Conflict(format!(
			"molecule vanished after insert; inchikey={missing}"
		)));
	}

	Ok(resolved)
}

pub async fn count_molecules(executor: &mut PgConnection) -> Result<i64> {
	let count: i64 =
		sqlx::query_scalar("SELECT count(*) FROM molecules").fetch_one(&mut *executor).await?;

	Ok(count)
}
