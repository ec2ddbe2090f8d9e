use std::time::Duration;

use reqwest::{
	Client, Response, StatusCode,
	header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::Serialize;
use serde_json::Value;

use crate::{Error, Result};
use opps_domain::{BulkOperation, SearchHit, SearchRequest, SearchResults, bulk};

const MAX_ERROR_BODY_CHARS: usize = 1_024;
const MAX_REPORTED_FAILURES: usize = 10;

/// Outcome of one bulk call as reported by the engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BulkSummary {
	pub took_ms: u64,
	pub errors: bool,
	pub item_count: usize,
	pub failed_count: usize,
	/// First few per-item failures, for logging.
	pub failures: Vec<BulkItemFailure>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BulkItemFailure {
	pub id: Option<String>,
	pub status: u16,
	pub reason: String,
}

/// HTTP client for an Elasticsearch cluster.
pub struct ElasticStore {
	client: Client,
	base_url: String,
}
impl ElasticStore {
	pub fn new(cfg: &opps_config::Elastic) -> Result<Self> {
		let mut headers = HeaderMap::new();

		if let Some(key) = cfg.api_key.as_deref() {
			headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("ApiKey {key}"))?);
		}

		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(headers)
			.build()?;

		Ok(Self { client, base_url: cfg.url.trim_end_matches('/').to_string() })
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// Liveness probe. Transport failures count as "not alive".
	pub async fn ping(&self) -> bool {
		match self.client.head(self.url("")).send().await {
			Ok(res) => res.status().is_success(),
			Err(err) => {
				tracing::debug!(error = %err, url = %self.base_url, "Search engine ping failed.");

				false
			},
		}
	}

	pub async fn bulk(&self, operations: &[BulkOperation]) -> Result<BulkSummary> {
		let body = encode_bulk_body(operations)?;
		let res = self
			.client
			.post(self.url("_bulk"))
			.header(CONTENT_TYPE, "application/x-ndjson")
			.body(body)
			.send()
			.await?;
		let json: Value = check_status(res).await?.json().await?;

		Ok(parse_bulk_response(&json))
	}

	pub async fn search(&self, request: &SearchRequest) -> Result<SearchResults<SearchHit>> {
		let path = format!("{}/{}/_search", request.index(), request.doc_type());
		let res = self.client.post(self.url(&path)).json(&request.body()).send().await?;
		let json: Value = check_status(res).await?.json().await?;

		parse_search_response(json)
	}

	pub async fn index_exists(&self, index: &str) -> Result<bool> {
		let res = self.client.head(self.url(index)).send().await?;

		match res.status() {
			StatusCode::NOT_FOUND => Ok(false),
			status if status.is_success() => Ok(true),
			status => Err(Error::Elastic {
				status: status.as_u16(),
				message: format!("Unexpected status while checking index {index}."),
			}),
		}
	}

	pub async fn put_mapping(&self, index: &str, doc_type: &str, mapping: &Value) -> Result<()> {
		let path = format!("{index}/_mapping/{doc_type}");
		let res = self.client.put(self.url(&path)).json(mapping).send().await?;

		check_status(res).await?;

		Ok(())
	}

	pub async fn delete_index(&self, index: &str) -> Result<()> {
		let res = self.client.delete(self.url(index)).send().await?;

		check_status(res).await?;

		Ok(())
	}

	fn url(&self, path: &str) -> String {
		format!("{}/{}", self.base_url, path)
	}
}

/// Newline-delimited JSON, one line per entry, with the trailing newline the engine requires.
pub fn encode_bulk_body(operations: &[BulkOperation]) -> Result<String> {
	let mut body = String::new();

	for entry in bulk::to_entries(operations) {
		body.push_str(&serde_json::to_string(&entry)?);
		body.push('\n');
	}

	Ok(body)
}

pub fn parse_bulk_response(json: &Value) -> BulkSummary {
	let items = json.get("items").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);
	let mut failed_count = 0;
	let mut failures = Vec::new();

	for item in items {
		let Some(result) = item.as_object().and_then(|object| object.values().next()) else {
			continue;
		};
		let status = result.get("status").and_then(Value::as_u64).unwrap_or(0) as u16;
		let error = result.get("error");

		if error.is_none() && status < 300 {
			continue;
		}

		failed_count += 1;

		if failures.len() < MAX_REPORTED_FAILURES {
			failures.push(BulkItemFailure {
				id: result.get("_id").and_then(Value::as_str).map(str::to_string),
				status,
				reason: error
					.and_then(|error| error.get("reason").and_then(Value::as_str))
					.map(str::to_string)
					.or_else(|| error.map(Value::to_string))
					.unwrap_or_else(|| "unknown".to_string()),
			});
		}
	}

	BulkSummary {
		took_ms: json.get("took").and_then(Value::as_u64).unwrap_or(0),
		errors: json.get("errors").and_then(Value::as_bool).unwrap_or(failed_count > 0),
		item_count: items.len(),
		failed_count,
		failures,
	}
}

/// Accepts both `hits.total: n` and `hits.total: { "value": n }`.
pub fn parse_search_response(mut json: Value) -> Result<SearchResults<SearchHit>> {
	let hits = json
		.get_mut("hits")
		.map(Value::take)
		.ok_or_else(|| Error::InvalidResponse("search response is missing hits.".to_string()))?;
	let total_hits = match hits.get("total") {
		Some(Value::Number(total)) => total.as_u64(),
		Some(Value::Object(total)) => total.get("value").and_then(Value::as_u64),
		_ => None,
	}
	.unwrap_or(0);
	let hits = match hits.get("hits") {
		Some(list) => serde_json::from_value::<Vec<SearchHit>>(list.clone())?,
		None => Vec::new(),
	};

	Ok(SearchResults { total_hits, hits })
}

async fn check_status(res: Response) -> Result<Response> {
	let status = res.status();

	if status.is_success() {
		return Ok(res);
	}

	let mut message = res.text().await.unwrap_or_default();

	if message.chars().count() > MAX_ERROR_BODY_CHARS {
		message = message.chars().take(MAX_ERROR_BODY_CHARS).collect();
	}

	Err(Error::Elastic { status: status.as_u16(), message })
}
