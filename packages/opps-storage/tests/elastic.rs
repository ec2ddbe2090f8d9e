use opps_config::Elastic;
use opps_domain::{IndexTarget, bulk};
use opps_storage::elastic::ElasticStore;

fn store(url: &str) -> ElasticStore {
	let cfg = Elastic {
		url: url.to_string(),
		api_key: None,
		timeout_ms: 5_000,
		task_index: "task".to_string(),
		user_index: "user".to_string(),
		mapping_dir: "mappings".into(),
	};

	ElasticStore::new(&cfg).expect("Failed to build search engine client.")
}

#[tokio::test]
async fn unreachable_engine_is_not_alive() {
	let store = store("http://127.0.0.1:9");

	assert!(!store.ping().await);
}

#[tokio::test]
#[ignore = "Requires external Elasticsearch. Set OPPS_ELASTIC_URL to run."]
async fn bulk_index_then_delete_index() {
	let Some(url) = opps_testkit::env_elastic_url() else {
		eprintln!("Skipping bulk_index_then_delete_index; set OPPS_ELASTIC_URL to run this test.");

		return;
	};
	let store = store(&url);
	let index = opps_testkit::unique_name("opps_test");
	let target = IndexTarget::new(index.as_str(), "task");
	let records = vec![serde_json::json!({ "id": 1, "title": "Chef" })];

	assert!(store.ping().await);

	let summary = store.bulk(&bulk::index_batch(&target, &records)).await.expect("Bulk failed.");

	assert_eq!(summary.item_count, 1);
	assert_eq!(summary.failed_count, 0);
	assert!(store.index_exists(&index).await.expect("Exists check failed."));

	store.delete_index(&index).await.expect("Delete index failed.");

	assert!(!store.index_exists(&index).await.expect("Exists check failed."));
}
