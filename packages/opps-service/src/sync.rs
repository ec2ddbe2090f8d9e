//! Keeps the search index consistent with the index source.
//!
//! Batch operations fetch their candidate records, build one bulk batch in memory and submit it
//! in a single call. Empty candidate sets never reach the engine. Single-record operations are
//! gated on the engine liveness probe and return `None` without touching the source when the
//! engine is down.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::{Error, OppsService, Result};
use opps_domain::{BulkOperation, RecordType, bulk};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeletedRecord {
	pub record_type: RecordType,
	pub index: String,
	pub id: String,
}

impl OppsService {
	pub async fn reindex_all(&self, record_type: RecordType) -> Result<Vec<Value>> {
		let records = match record_type {
			RecordType::Task => self.source.tasks_to_index().await?,
			RecordType::User => self.source.users_to_index().await?,
		};

		self.submit_index(record_type, &records).await?;

		Ok(records)
	}

	/// Applies the mapping file to an existing index, dropping the index when the engine rejects
	/// it, and then reindexes every record of `record_type`.
	pub async fn remap(&self, record_type: RecordType) -> Result<Vec<Value>> {
		let target = self.index_target(record_type);

		if self.client.index_exists(&target.index).await? {
			let mapping = load_mapping(&self.cfg.storage.elastic.mapping_dir, record_type)?;

			if let Err(err) = self.client.put_mapping(&target.index, &target.doc_type, &mapping).await
			{
				tracing::error!(
					error = %err,
					index = %target.index,
					"Failed to apply mapping. Deleting index before reindex."
				);

				match self.client.delete_index(&target.index).await {
					Ok(()) => tracing::warn!(index = %target.index, "Deleted search index."),
					Err(err) => tracing::error!(
						error = %err,
						index = %target.index,
						"Failed to delete search index."
					),
				}
			}
		} else {
			tracing::info!(index = %target.index, "Search index does not exist. Skipping mapping.");
		}

		self.reindex_all(record_type).await
	}

	pub async fn index_one(&self, record_type: RecordType, id: &str) -> Result<Option<Vec<Value>>> {
		if !self.client.is_alive().await {
			tracing::warn!(%record_type, id, "Search engine is not alive. Skipping index.");

			return Ok(None);
		}

		let records = match record_type {
			RecordType::Task => self.source.task_to_index(id).await?,
			RecordType::User => self.source.user_to_index(id).await?,
		};

		self.submit_index(record_type, &records).await?;

		Ok(Some(records))
	}

	pub async fn delete_one(
		&self,
		record_type: RecordType,
		id: &str,
	) -> Result<Option<DeletedRecord>> {
		if !self.client.is_alive().await {
			tracing::warn!(%record_type, id, "Search engine is not alive. Skipping delete.");

			return Ok(None);
		}

		let target = self.index_target(record_type);

		self.submit(vec![bulk::delete_one(&target, id)]).await?;

		Ok(Some(DeletedRecord { record_type, index: target.index, id: id.to_string() }))
	}

	pub async fn reindex_cycle(&self, cycle_id: &str) -> Result<Vec<Value>> {
		let records = self.source.cycle_tasks_to_index(cycle_id).await?;

		self.submit_index(RecordType::Task, &records).await?;

		Ok(records)
	}

	pub async fn reindex_agency(&self, agency_id: &str) -> Result<Vec<Value>> {
		let records = self.source.agency_tasks_to_index(agency_id).await?;

		self.submit_index(RecordType::Task, &records).await?;

		Ok(records)
	}

	pub async fn reindex_community(&self, community_id: &str) -> Result<Vec<Value>> {
		let records = self.source.community_tasks_to_index(community_id).await?;

		self.submit_index(RecordType::Task, &records).await?;

		Ok(records)
	}

	/// Removes every task of a community from the index.
	pub async fn delete_community(&self, community_id: &str) -> Result<Vec<Value>> {
		let records = self.source.community_tasks_to_index(community_id).await?;
		let target = self.index_target(RecordType::Task);
		let operations = bulk::delete_batch(&target, &records);

		if operations.len() < records.len() {
			tracing::warn!(
				community_id,
				records = records.len(),
				skipped = records.len() - operations.len(),
				"Skipping community records without an id."
			);
		}

		self.submit(operations).await?;

		Ok(records)
	}

	async fn submit_index(&self, record_type: RecordType, records: &[Value]) -> Result<()> {
		let target = self.index_target(record_type);

		self.submit(bulk::index_batch(&target, records)).await
	}

	async fn submit(&self, operations: Vec<BulkOperation>) -> Result<()> {
		if operations.is_empty() {
			tracing::debug!("No records to submit. Skipping bulk call.");

			return Ok(());
		}

		tracing::debug!(operations = operations.len(), "Submitting bulk batch.");

		let summary = self.client.bulk(&operations).await?;

		if summary.errors || summary.failed_count > 0 {
			tracing::warn!(
				items = summary.item_count,
				failed = summary.failed_count,
				failures = ?summary.failures,
				"Bulk batch reported item errors."
			);
		} else {
			tracing::info!(
				items = summary.item_count,
				took_ms = summary.took_ms,
				"Bulk batch applied."
			);
		}

		Ok(())
	}
}

/// Reads `<dir>/<type>_mapping.json` and returns the body stored under the document type key.
pub fn load_mapping(dir: &Path, record_type: RecordType) -> Result<Value> {
	let path = dir.join(record_type.mapping_file());
	let mapping_error =
		|message: String| Error::Mapping { path: path.display().to_string(), message };
	let raw = std::fs::read_to_string(&path).map_err(|err| mapping_error(err.to_string()))?;
	let mut document: Value =
		serde_json::from_str(&raw).map_err(|err| mapping_error(err.to_string()))?;

	document
		.get_mut(record_type.doc_type())
		.map(Value::take)
		.ok_or_else(|| mapping_error(format!("missing top-level key '{}'.", record_type.doc_type())))
}
