use serde_json::Value;

use opps_config::Postgres;
use opps_storage::{db::Db, sources};
use opps_testkit::TestDatabase;

const SCHEMA: [&str; 2] = [
	"\
CREATE TABLE task_search_documents (
	id bigint PRIMARY KEY,
	cycle_id bigint,
	agency_id bigint,
	community_id bigint,
	document jsonb NOT NULL
)",
	"\
CREATE TABLE user_search_documents (
	id bigint PRIMARY KEY,
	document jsonb NOT NULL
)",
];

async fn seed(db: &Db) {
	for statement in SCHEMA {
		sqlx::query(statement).execute(&db.pool).await.expect("Failed to create schema.");
	}

	for (id, cycle_id, agency_id, community_id) in [(1_i64, 10_i64, 100_i64, 7_i64), (2, 11, 100, 8)]
	{
		sqlx::query(
			"\
INSERT INTO task_search_documents (id, cycle_id, agency_id, community_id, document)
VALUES ($1, $2, $3, $4, $5)",
		)
		.bind(id)
		.bind(cycle_id)
		.bind(agency_id)
		.bind(community_id)
		.bind(serde_json::json!({ "id": id, "title": format!("Task {id}") }))
		.execute(&db.pool)
		.await
		.expect("Failed to insert task document.");
	}

	sqlx::query("INSERT INTO user_search_documents (id, document) VALUES ($1, $2)")
		.bind(3_i64)
		.bind(serde_json::json!({ "id": 3, "name": "Ada" }))
		.execute(&db.pool)
		.await
		.expect("Failed to insert user document.");
}

fn ids(records: &[Value]) -> Vec<i64> {
	records.iter().filter_map(|record| record["id"].as_i64()).collect()
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set OPPS_PG_DSN to run."]
async fn sources_scope_documents_by_id_columns() {
	let Some(base_dsn) = opps_testkit::env_dsn() else {
		eprintln!("Skipping sources_scope_documents_by_id_columns; set OPPS_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	seed(&db).await;

	let all = sources::tasks_to_index(&db).await.expect("Failed to fetch tasks.");
	let cycle = sources::cycle_tasks_to_index(&db, "11").await.expect("Failed to fetch cycle.");
	let agency = sources::agency_tasks_to_index(&db, "100").await.expect("Failed to fetch agency.");
	let community =
		sources::community_tasks_to_index(&db, "7").await.expect("Failed to fetch community.");
	let missing = sources::task_to_index(&db, "99").await.expect("Failed to fetch task.");
	let users = sources::users_to_index(&db).await.expect("Failed to fetch users.");
	let user = sources::user_to_index(&db, "3").await.expect("Failed to fetch user.");

	assert_eq!(ids(&all), vec![1, 2]);
	assert_eq!(ids(&cycle), vec![2]);
	assert_eq!(ids(&agency), vec![1, 2]);
	assert_eq!(ids(&community), vec![1]);
	assert!(missing.is_empty());
	assert_eq!(ids(&users), vec![3]);
	assert_eq!(user[0]["name"], "Ada");

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
