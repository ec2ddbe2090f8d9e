//! Records ready to index, read from the relational source of truth.
//!
//! The application database exposes one JSON document per record through the
//! `task_search_documents` and `user_search_documents` relations. Ids are compared as text so
//! callers never need to know the column types behind them.

use serde_json::Value;

use crate::{Result, db::Db};

const ALL_TASKS: &str = "\
SELECT document
FROM task_search_documents
ORDER BY id";
const ALL_USERS: &str = "\
SELECT document
FROM user_search_documents
ORDER BY id";
const CYCLE_TASKS: &str = "\
SELECT document
FROM task_search_documents
WHERE cycle_id::text = $1
ORDER BY id";
const AGENCY_TASKS: &str = "\
SELECT document
FROM task_search_documents
WHERE agency_id::text = $1
ORDER BY id";
const COMMUNITY_TASKS: &str = "\
SELECT document
FROM task_search_documents
WHERE community_id::text = $1
ORDER BY id";
const ONE_TASK: &str = "\
SELECT document
FROM task_search_documents
WHERE id::text = $1";
const ONE_USER: &str = "\
SELECT document
FROM user_search_documents
WHERE id::text = $1";

pub async fn tasks_to_index(db: &Db) -> Result<Vec<Value>> {
	fetch_documents(db, ALL_TASKS, None).await
}

pub async fn users_to_index(db: &Db) -> Result<Vec<Value>> {
	fetch_documents(db, ALL_USERS, None).await
}

pub async fn cycle_tasks_to_index(db: &Db, cycle_id: &str) -> Result<Vec<Value>> {
	fetch_documents(db, CYCLE_TASKS, Some(cycle_id)).await
}

pub async fn agency_tasks_to_index(db: &Db, agency_id: &str) -> Result<Vec<Value>> {
	fetch_documents(db, AGENCY_TASKS, Some(agency_id)).await
}

pub async fn community_tasks_to_index(db: &Db, community_id: &str) -> Result<Vec<Value>> {
	fetch_documents(db, COMMUNITY_TASKS, Some(community_id)).await
}

/// Zero or one document.
pub async fn task_to_index(db: &Db, task_id: &str) -> Result<Vec<Value>> {
	fetch_documents(db, ONE_TASK, Some(task_id)).await
}

/// Zero or one document.
pub async fn user_to_index(db: &Db, user_id: &str) -> Result<Vec<Value>> {
	fetch_documents(db, ONE_USER, Some(user_id)).await
}

async fn fetch_documents(db: &Db, sql: &'static str, id: Option<&str>) -> Result<Vec<Value>> {
	let mut query = sqlx::query_scalar::<_, Value>(sql);

	if let Some(id) = id {
		query = query.bind(id.to_string());
	}

	let documents = query.fetch_all(&db.pool).await?;

	Ok(documents)
}
