use synroute_domain::route::MoleculeNode;

use super::{TARGET_KEY, build_service, convergent_route, count, route_input, seed, test_db};

fn assert_same_shape(input: &MoleculeNode, tree: &synroute_domain::tree::TreeNode) {
	assert_eq!(input.inchikey, tree.inchikey);
	assert_eq!(input.reactants().is_empty(), tree.is_leaf);
	assert_eq!(input.reactants().len(), tree.children.len());

	for (reactant, child) in input.reactants().iter().zip(&tree.children) {
		assert_same_shape(reactant, child);
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn identical_route_for_two_runs_is_stored_once() {
	let Some(test_db) = test_db("identical_route_for_two_runs_is_stored_once").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let (target, runs) = seed(&service, &["model-a", "model-b"]).await;
	let route = route_input(convergent_route(), 1, "sig-convergent");
	let first = service
		.ingest_route(runs[0].run_id, target.target_id, &route)
		.await
		.expect("First ingestion failed.");
	let stored = service.get_route_tree(first.route_id).await.expect("Failed to read route.");

	assert!(!first.was_reused);
	assert_eq!(stored.route.length, 2);
	assert!(stored.route.is_convergent);
	assert_eq!(count(&service, "SELECT count(*) FROM route_nodes").await, 4);
	assert_eq!(count(&service, "SELECT count(*) FROM prediction_routes").await, 1);

	let second = service
		.ingest_route(runs[1].run_id, target.target_id, &route)
		.await
		.expect("Second ingestion failed.");

	assert!(second.was_reused);
	assert_eq!(second.route_id, first.route_id);
	assert_ne!(second.prediction_route_id, first.prediction_route_id);
	assert_eq!(count(&service, "SELECT count(*) FROM routes").await, 1);
	assert_eq!(count(&service, "SELECT count(*) FROM route_nodes").await, 4);
	assert_eq!(count(&service, "SELECT count(*) FROM prediction_routes").await, 2);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn stored_tree_reads_back_as_the_input_tree() {
	let Some(test_db) = test_db("stored_tree_reads_back_as_the_input_tree").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let input = convergent_route();
	let outcome = service
		.get_or_create_route("sig-round-trip", "hash", &input)
		.await
		.expect("Failed to store route.");
	let tree = service.get_route_tree(outcome.route_id).await.expect("Failed to read route.");

	assert_same_shape(&input, &tree.root);
	assert_eq!(tree.root.inchikey, TARGET_KEY);
	assert!(tree.root.reaction_hash.is_some());
	assert_eq!(tree.root.node_count(), 4);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn root_only_route_has_one_node() {
	let Some(test_db) = test_db("root_only_route_has_one_node").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let root = MoleculeNode::leaf(super::TARGET_SMILES, TARGET_KEY);
	let outcome =
		service.get_or_create_route("sig-root", "hash", &root).await.expect("Failed to store.");

	assert_eq!(outcome.length, 0);
	assert!(!outcome.is_convergent);
	assert_eq!(count(&service, "SELECT count(*) FROM route_nodes").await, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn malformed_tree_leaves_nothing_behind() {
	let Some(test_db) = test_db("malformed_tree_leaves_nothing_behind").await else {
		return;
	};
	let service = build_service(&test_db).await;
	let mut root = convergent_route();

	root.is_leaf = Some(true);

	let err = service
		.get_or_create_route("sig-bad", "hash", &root)
		.await
		.expect_err("A contradictory leaf flag must be rejected.");

	assert_eq!(err.code(), "MALFORMED_TREE");
	assert_eq!(count(&service, "SELECT count(*) FROM routes").await, 0);
	assert_eq!(count(&service, "SELECT count(*) FROM molecules").await, 0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SYNROUTE_PG_DSN to run."]
async fn concurrent_ingestion_of_one_signature_stores_one_route() {
	let Some(test_db) = test_db("concurrent_ingestion_of_one_signature_stores_one_route").await
	else {
		return;
	};
	let service = build_service(&test_db).await;
	let (target, runs) = seed(&service, &["model-a", "model-b"]).await;
	let route = route_input(convergent_route(), 1, "sig-race");
	let (left, right) = tokio::join!(
		service.ingest_route(runs[0].run_id, target.target_id, &route),
		service.ingest_route(runs[1].run_id, target.target_id, &route),
	);
	let left = left.expect("Left ingestion failed.");
	let right = right.expect("Right ingestion failed.");

	assert_eq!(left.route_id, right.route_id);
	assert_ne!(left.was_reused, right.was_reused, "Exactly one call must create the route.");
	assert_eq!(count(&service, "SELECT count(*) FROM routes").await, 1);
	assert_eq!(count(&service, "SELECT count(*) FROM route_nodes").await, 4);
	assert_eq!(count(&service, "SELECT count(*) FROM prediction_routes").await, 2);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
