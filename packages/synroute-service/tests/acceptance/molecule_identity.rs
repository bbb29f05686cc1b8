use synroute_domain::identity::MoleculeIdentity;

use super::{build_service, count, test_db};

fn identity(smiles: &str, inchikey: &str) -> MoleculeIdentity {
	MoleculeIdentity { smiles: smiles.to_string(), inchikey: inchikey.to_string() }
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn same_identity_key_resolves_to_the_first_molecule() {
	let Some(test_db) = test_db("same_identity_key_resolves_to_the_first_molecule").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let first = service
		.resolve_molecules(&[identity("CCO", "LFQSCWFLJHTTHZ-UHFFFAOYSA-N")])
		.await
		.expect("Failed to resolve molecules.");
	let second = service
		.resolve_molecules(&[
			identity("OCC", "LFQSCWFLJHTTHZ-UHFFFAOYSA-N"),
			identity("C(C)O", "LFQSCWFLJHTTHZ-UHFFFAOYSA-N"),
			identity("CC=O", "IKHGUXGNUITLKF-UHFFFAOYSA-N"),
		])
		.await
		.expect("Failed to resolve molecules.");

	assert_eq!(
		first["LFQSCWFLJHTTHZ-UHFFFAOYSA-N"],
		second["LFQSCWFLJHTTHZ-UHFFFAOYSA-N"]
	);
	assert_eq!(count(&service, "SELECT count(*) FROM molecules").await, 2);

	let smiles: String =
		sqlx::query_scalar("SELECT smiles FROM molecules WHERE inchikey = $1")
			.bind("LFQSCWFLJHTTHZ-UHFFFAOYSA-N")
			.fetch_one(&service.db.pool)
			.await
			.expect("Failed to read molecule.");

	assert_eq!(smiles, "CCO");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn concurrent_resolution_of_one_key_does_not_fail() {
	let Some(test_db) = test_db("concurrent_resolution_of_one_key_does_not_fail").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let batch = [identity("CCO", "LFQSCWFLJHTTHZ-UHFFFAOYSA-N")];
	let (left, right) =
		tokio::join!(service.resolve_molecules(&batch), service.resolve_molecules(&batch));
	let left = left.expect("Left resolution failed.");
	let right = right.expect("Right resolution failed.");

	assert_eq!(left, right);
	assert_eq!(count(&service, "SELECT count(*) FROM molecules").await, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn blank_identity_key_is_rejected_before_writing() {
	let Some(test_db) = test_db("blank_identity_key_is_rejected_before_writing").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let err = service
		.resolve_molecules(&[identity("CCO", "LFQSCWFLJHTTHZ-UHFFFAOYSA-N"), identity("CC", " ")])
		.await
		.expect_err("A blank key must be rejected.");

	assert_eq!(err.code(), "INVALID_REQUEST");
	assert_eq!(count(&service, "SELECT count(*) FROM molecules").await, 0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
