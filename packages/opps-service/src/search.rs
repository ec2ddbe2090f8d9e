use time::OffsetDateTime;

use crate::{OppsService, Result};
use opps_domain::{
	CallerContext, QueryParams, RawHit, RecordType, ResultModel, SearchRequest, SearchResults,
	query, result,
};

impl OppsService {
	/// Compiles `params` against the configured task index.
	pub fn compile(&self, params: &QueryParams, caller: &CallerContext) -> SearchRequest {
		query::compile(
			params,
			caller,
			Some(&self.cfg.storage.elastic.task_index),
			OffsetDateTime::now_utc(),
		)
	}

	pub async fn search(
		&self,
		params: &QueryParams,
		caller: &CallerContext,
	) -> Result<SearchResults<ResultModel>> {
		let request = self.compile(params, caller);

		self.search_opportunities(Some(request)).await
	}

	/// Runs `request`, or a match-all over the task index, and projects every hit.
	pub async fn search_opportunities(
		&self,
		request: Option<SearchRequest>,
	) -> Result<SearchResults<ResultModel>> {
		let request = request.unwrap_or_else(|| self.match_all(RecordType::Task));
		let found = self.client.search(&request).await?;

		tracing::debug!(
			index = request.index(),
			total_hits = found.total_hits,
			returned = found.hits.len(),
			"Task search completed."
		);

		Ok(SearchResults {
			total_hits: found.total_hits,
			hits: found.hits.iter().map(result::project).collect(),
		})
	}

	/// Runs `request`, or a match-all over the user index. User hits are returned unprojected.
	pub async fn search_users(
		&self,
		request: Option<SearchRequest>,
	) -> Result<SearchResults<RawHit>> {
		let request = request.unwrap_or_else(|| self.match_all(RecordType::User));
		let found = self.client.search(&request).await?;

		Ok(SearchResults {
			total_hits: found.total_hits,
			hits: found.hits.into_iter().map(RawHit::from).collect(),
		})
	}

	fn match_all(&self, record_type: RecordType) -> SearchRequest {
		let target = self.index_target(record_type);

		SearchRequest::match_all(&target.index, &target.doc_type)
	}
}
