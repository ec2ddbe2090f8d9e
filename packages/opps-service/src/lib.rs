pub mod search;
pub mod sync;

mod error;

pub use error::{Error, Result};
pub use sync::DeletedRecord;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use opps_config::Config;
use opps_domain::{BulkOperation, IndexTarget, RecordType, SearchHit, SearchRequest, SearchResults};
use opps_storage::{
	db::Db,
	elastic::{BulkSummary, ElasticStore},
	sources,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Source of truth for the records kept in the search index.
pub trait IndexSource
where
	Self: Send + Sync,
{
	fn tasks_to_index(&self) -> BoxFuture<'_, Result<Vec<Value>>>;

	fn users_to_index(&self) -> BoxFuture<'_, Result<Vec<Value>>>;

	fn cycle_tasks_to_index<'a>(&'a self, cycle_id: &'a str) -> BoxFuture<'a, Result<Vec<Value>>>;

	fn agency_tasks_to_index<'a>(&'a self, agency_id: &'a str)
	-> BoxFuture<'a, Result<Vec<Value>>>;

	fn community_tasks_to_index<'a>(
		&'a self,
		community_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<Value>>>;

	fn task_to_index<'a>(&'a self, task_id: &'a str) -> BoxFuture<'a, Result<Vec<Value>>>;

	fn user_to_index<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Vec<Value>>>;
}

/// The search engine operations the service depends on.
pub trait SearchClient
where
	Self: Send + Sync,
{
	fn bulk<'a>(&'a self, operations: &'a [BulkOperation]) -> BoxFuture<'a, Result<BulkSummary>>;

	fn search<'a>(
		&'a self,
		request: &'a SearchRequest,
	) -> BoxFuture<'a, Result<SearchResults<SearchHit>>>;

	fn index_exists<'a>(&'a self, index: &'a str) -> BoxFuture<'a, Result<bool>>;

	fn put_mapping<'a>(
		&'a self,
		index: &'a str,
		doc_type: &'a str,
		mapping: &'a Value,
	) -> BoxFuture<'a, Result<()>>;

	fn delete_index<'a>(&'a self, index: &'a str) -> BoxFuture<'a, Result<()>>;

	fn is_alive(&self) -> BoxFuture<'_, bool>;
}

pub struct OppsService {
	pub cfg: Config,
	pub source: Arc<dyn IndexSource>,
	pub client: Arc<dyn SearchClient>,
}
impl OppsService {
	pub fn new(cfg: Config, db: Db, elastic: ElasticStore) -> Self {
		Self { cfg, source: Arc::new(db), client: Arc::new(elastic) }
	}

	pub fn with_backends(
		cfg: Config,
		source: Arc<dyn IndexSource>,
		client: Arc<dyn SearchClient>,
	) -> Self {
		Self { cfg, source, client }
	}

	/// Configured index and document type for `record_type`.
	pub fn index_target(&self, record_type: RecordType) -> IndexTarget {
		let elastic = &self.cfg.storage.elastic;
		let index = match record_type {
			RecordType::Task => &elastic.task_index,
			RecordType::User => &elastic.user_index,
		};

		IndexTarget::new(index.as_str(), record_type.doc_type())
	}
}

impl IndexSource for Db {
	fn tasks_to_index(&self) -> BoxFuture<'_, Result<Vec<Value>>> {
		Box::pin(async move { Ok(sources::tasks_to_index(self).await?) })
	}

	fn users_to_index(&self) -> BoxFuture<'_, Result<Vec<Value>>> {
		Box::pin(async move { Ok(sources::users_to_index(self).await?) })
	}

	fn cycle_tasks_to_index<'a>(&'a self, cycle_id: &'a str) -> BoxFuture<'a, Result<Vec<Value>>> {
		Box::pin(async move { Ok(sources::cycle_tasks_to_index(self, cycle_id).await?) })
	}

	fn agency_tasks_to_index<'a>(
		&'a self,
		agency_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<Value>>> {
		Box::pin(async move { Ok(sources::agency_tasks_to_index(self, agency_id).await?) })
	}

	fn community_tasks_to_index<'a>(
		&'a self,
		community_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<Value>>> {
		Box::pin(async move { Ok(sources::community_tasks_to_index(self, community_id).await?) })
	}

	fn task_to_index<'a>(&'a self, task_id: &'a str) -> BoxFuture<'a, Result<Vec<Value>>> {
		Box::pin(async move { Ok(sources::task_to_index(self, task_id).await?) })
	}

	fn user_to_index<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Vec<Value>>> {
		Box::pin(async move { Ok(sources::user_to_index(self, user_id).await?) })
	}
}

impl SearchClient for ElasticStore {
	fn bulk<'a>(&'a self, operations: &'a [BulkOperation]) -> BoxFuture<'a, Result<BulkSummary>> {
		Box::pin(async move { Ok(ElasticStore::bulk(self, operations).await?) })
	}

	fn search<'a>(
		&'a self,
		request: &'a SearchRequest,
	) -> BoxFuture<'a, Result<SearchResults<SearchHit>>> {
		Box::pin(async move { Ok(ElasticStore::search(self, request).await?) })
	}

	fn index_exists<'a>(&'a self, index: &'a str) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(ElasticStore::index_exists(self, index).await?) })
	}

	fn put_mapping<'a>(
		&'a self,
		index: &'a str,
		doc_type: &'a str,
		mapping: &'a Value,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(ElasticStore::put_mapping(self, index, doc_type, mapping).await?) })
	}

	fn delete_index<'a>(&'a self, index: &'a str) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(ElasticStore::delete_index(self, index).await?) })
	}

	fn is_alive(&self) -> BoxFuture<'_, bool> {
		Box::pin(self.ping())
	}
}
