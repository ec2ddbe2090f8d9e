//! Compiles caller query parameters into a structured search request.
//!
//! Compilation never fails: absent, blank or unparsable parameters fall back to defaults, and a
//! dimension without a usable value simply adds no filter.

use std::collections::HashSet;

use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::params::{CallerContext, InternshipFlag, ParamValue, QueryParams};

pub const DEFAULT_TASK_INDEX: &str = "task";
pub const TASK_DOC_TYPE: &str = "task";
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const RESTRICTED_AGENCY_FIELD: &str = "restrictedToAgency";
/// Agency restriction value stored on documents that no caller scope should ever reach.
pub const NONE_MATCHING_AGENCY: &str = "null";
/// Filter value meaning "do not filter this dimension".
pub const ALL_SENTINEL: &str = "_all";

const EXCLUDED_INTERNSHIP_STATES: [&str; 2] = ["submitted", "draft"];
const DEFAULT_STATE: &str = "open";
const FIELD_PATH_PATTERN: &str = r"^[A-Za-z0-9_]+(\.[A-Za-z0-9_]+)*$";
const POSTING_LOCATION_FIELDS: [&str; 5] = [
	"postingLocation.cityName",
	"postingLocation.countrySubdivision",
	"postingLocation.country",
	"postingLocation.cityCountrySubdivision",
	"postingLocation.cityCountry",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
	Asc,
	Desc,
}
impl SortOrder {
	fn as_str(self) -> &'static str {
		match self {
			Self::Asc => "asc",
			Self::Desc => "desc",
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SortKey {
	/// Sorted in the engine's default direction for the field.
	Field(String),
	Directed { field: String, order: SortOrder },
}
impl SortKey {
	pub fn field(&self) -> &str {
		match self {
			Self::Field(field) => field,
			Self::Directed { field, .. } => field,
		}
	}

	pub fn to_value(&self) -> Value {
		match self {
			Self::Field(field) => Value::String(field.clone()),
			Self::Directed { field, order } => serde_json::json!({ field: order.as_str() }),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterClause {
	Terms { field: String, values: Vec<String> },
	RangeGte { field: String, value: String },
	RangeLte { field: String, value: String },
}
impl FilterClause {
	pub fn field(&self) -> &str {
		match self {
			Self::Terms { field, .. } => field,
			Self::RangeGte { field, .. } => field,
			Self::RangeLte { field, .. } => field,
		}
	}

	pub fn to_value(&self) -> Value {
		match self {
			Self::Terms { field, values } => serde_json::json!({ "terms": { field: values } }),
			Self::RangeGte { field, value } => {
				serde_json::json!({ "range": { field: { "gte": value } } })
			},
			Self::RangeLte { field, value } => {
				serde_json::json!({ "range": { field: { "lte": value } } })
			},
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShouldClause {
	MultiMatch { fields: Vec<String>, query: String },
}
impl ShouldClause {
	pub fn to_value(&self) -> Value {
		match self {
			Self::MultiMatch { fields, query } => {
				serde_json::json!({ "multi_match": { "fields": fields, "query": query } })
			},
		}
	}
}

/// The boolean part of a compiled request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoolQuery {
	must: Vec<FilterClause>,
	must_not: Vec<FilterClause>,
	should: Vec<ShouldClause>,
	minimum_should_match: u32,
	text: Option<String>,
}
impl BoolQuery {
	pub fn must(&self) -> &[FilterClause] {
		&self.must
	}

	pub fn must_not(&self) -> &[FilterClause] {
		&self.must_not
	}

	pub fn should(&self) -> &[ShouldClause] {
		&self.should
	}

	pub fn minimum_should_match(&self) -> u32 {
		self.minimum_should_match
	}

	/// Free-text clause, if any.
	pub fn text(&self) -> Option<&str> {
		self.text.as_deref()
	}

	/// Values of the `terms` clause on `field` in the mandatory group.
	pub fn terms(&self, field: &str) -> Option<&[String]> {
		self.must.iter().find_map(|clause| match clause {
			FilterClause::Terms { field: name, values } if name == field => Some(values.as_slice()),
			_ => None,
		})
	}

	pub fn to_value(&self) -> Value {
		let mut bool_query = serde_json::json!({
			"filter": {
				"bool": {
					"must": self.must.iter().map(FilterClause::to_value).collect::<Vec<_>>(),
					"must_not": self.must_not.iter().map(FilterClause::to_value).collect::<Vec<_>>(),
				},
			},
			"should": self.should.iter().map(ShouldClause::to_value).collect::<Vec<_>>(),
			"minimum_should_match": self.minimum_should_match,
		});

		if let (Some(text), Some(object)) = (self.text.as_ref(), bool_query.as_object_mut()) {
			object.insert(
				"must".to_string(),
				serde_json::json!({ "simple_query_string": { "query": text } }),
			);
		}

		serde_json::json!({ "bool": bool_query })
	}
}

/// A compiled, immutable search request for one search call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
	index: String,
	doc_type: String,
	from: u64,
	size: u64,
	sort: Vec<SortKey>,
	query: BoolQuery,
}
impl SearchRequest {
	/// Unfiltered request over a whole index, first page.
	pub fn match_all(index: &str, doc_type: &str) -> Self {
		Self {
			index: index.to_string(),
			doc_type: doc_type.to_string(),
			from: 0,
			size: DEFAULT_PAGE_SIZE as u64,
			sort: Vec::new(),
			query: BoolQuery::default(),
		}
	}

	pub fn index(&self) -> &str {
		&self.index
	}

	pub fn doc_type(&self) -> &str {
		&self.doc_type
	}

	pub fn from(&self) -> u64 {
		self.from
	}

	pub fn size(&self) -> u64 {
		self.size
	}

	pub fn sort(&self) -> &[SortKey] {
		&self.sort
	}

	pub fn query(&self) -> &BoolQuery {
		&self.query
	}

	/// Request body as sent to the `_search` endpoint.
	pub fn body(&self) -> Value {
		serde_json::json!({
			"from": self.from,
			"size": self.size,
			"sort": self.sort.iter().map(SortKey::to_value).collect::<Vec<_>>(),
			"query": self.query.to_value(),
		})
	}
}
impl Serialize for SearchRequest {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serde_json::json!({ "index": self.index, "type": self.doc_type, "body": self.body() })
			.serialize(serializer)
	}
}

/// Which agency-restricted documents a caller may see.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessScope {
	Unrestricted,
	Agencies(Vec<String>),
	NoneMatching,
}
impl AccessScope {
	pub fn resolve(caller: &CallerContext, params: &QueryParams) -> Self {
		match caller.user.as_ref() {
			Some(user) if user.is_admin => Self::Unrestricted,
			Some(user) if user.has_agency() => {
				let restrict = params.values("restrict");

				if restrict.is_empty() {
					return Self::Agencies(user.agency_ids.clone());
				}

				// `restrict` only narrows the caller's own agencies.
				let narrowed: Vec<String> = restrict
					.iter()
					.map(|value| strip_id_suffix(value))
					.filter(|id| user.agency_ids.iter().any(|own| own == id))
					.map(str::to_string)
					.collect();

				if narrowed.is_empty() { Self::NoneMatching } else { Self::Agencies(narrowed) }
			},
			_ if params.has("community") => Self::Unrestricted,
			_ => Self::NoneMatching,
		}
	}

	fn filter_values(&self) -> Option<Vec<String>> {
		match self {
			Self::Unrestricted => None,
			Self::Agencies(ids) => Some(ids.clone()),
			Self::NoneMatching => Some(vec![NONE_MATCHING_AGENCY.to_string()]),
		}
	}
}

#[derive(Default)]
struct BoolQueryBuilder {
	must: Vec<FilterClause>,
	must_not: Vec<FilterClause>,
	should: Vec<ShouldClause>,
	minimum_should_match: u32,
	text: Option<String>,
}
impl BoolQueryBuilder {
	fn build(self) -> BoolQuery {
		BoolQuery {
			must: self.must,
			must_not: self.must_not,
			should: self.should,
			minimum_should_match: self.minimum_should_match,
			text: self.text,
		}
	}
}

struct RequestBuilder {
	index: String,
	from: u64,
	size: u64,
	sort: Vec<SortKey>,
	query: BoolQueryBuilder,
}
impl RequestBuilder {
	fn build(self) -> SearchRequest {
		SearchRequest {
			index: self.index,
			doc_type: TASK_DOC_TYPE.to_string(),
			from: self.from,
			size: self.size,
			sort: self.sort,
			query: self.query.build(),
		}
	}
}

/// Compiles task search parameters for `caller`. `now` anchors the enrollment window filter.
pub fn compile(
	params: &QueryParams,
	caller: &CallerContext,
	index: Option<&str>,
	now: OffsetDateTime,
) -> SearchRequest {
	let (from, size) = resolve_paging(params);
	let mut builder = RequestBuilder {
		index: index.unwrap_or(DEFAULT_TASK_INDEX).to_string(),
		from,
		size,
		sort: resolve_sort(params),
		query: BoolQueryBuilder::default(),
	};
	let query = &mut builder.query;

	// Scope values bypass the `_all` sentinel so a caller cannot lift their own restriction.
	if let Some(agencies) = AccessScope::resolve(caller, params).filter_values() {
		query.must.push(FilterClause::Terms {
			field: RESTRICTED_AGENCY_FIELD.to_string(),
			values: agencies.iter().map(|value| strip_id_suffix(value).to_string()).collect(),
		});
	}

	add_free_text(query, params);

	let internship = InternshipFlag::resolve(params.get("isInternship"));

	if internship.is_yes() {
		add_internship_filters(query, params, now);
	} else {
		add_listing_filters(query, params);
	}

	add_common_filters(query, params);

	builder.build()
}

/// Returns `(from, size)`. Both are well defined for any input.
fn resolve_paging(params: &QueryParams) -> (u64, u64) {
	let page = params.integer("page").filter(|page| *page != 0).unwrap_or(1);
	let page_size =
		params.integer("resultsperpage").filter(|size| *size != 0).unwrap_or(DEFAULT_PAGE_SIZE);
	let from = page.saturating_sub(1).saturating_mul(page_size).max(0) as u64;
	let size = if page_size > 0 { page_size as u64 } else { DEFAULT_PAGE_SIZE as u64 };

	(from, size)
}

fn resolve_sort(params: &QueryParams) -> Vec<SortKey> {
	let mut sort =
		vec![SortKey::Directed { field: "publishedAt".to_string(), order: SortOrder::Desc }];
	let key = params.get("sort").and_then(|value| value.first()).map(str::trim).unwrap_or("");
	let leading = match key {
		"" | "relevance" => Some("_score"),
		"title" => Some("title.keyword"),
		"agency" => Some("agency.name"),
		// Base order already sorts by publication date.
		"posted-date" => None,
		"posted-by" => Some("ownerName"),
		"status" => Some("state"),
		"location" => Some("locations.name"),
		other if is_field_path(other) => Some(other),
		_ => None,
	};

	if let Some(field) = leading {
		sort.insert(0, SortKey::Field(field.to_string()));
	}

	sort
}

/// Dotted path of `[A-Za-z0-9_]` segments, the only shape accepted as a literal sort field.
fn is_field_path(raw: &str) -> bool {
	Regex::new(FIELD_PATH_PATTERN).map(|re| re.is_match(raw)).unwrap_or(false)
}

fn add_free_text(query: &mut BoolQueryBuilder, params: &QueryParams) {
	let mut terms = params.values("term");

	match params.get("keywords") {
		Some(ParamValue::Many(keywords)) => {
			for keyword in keywords {
				terms.push(keyword.clone());
			}

			let mut seen = HashSet::new();

			terms.retain(|term| seen.insert(term.clone()));
		},
		Some(ParamValue::One(keyword)) if !keyword.is_empty() => terms.push(keyword.clone()),
		_ => {},
	}

	if !terms.is_empty() {
		query.text = Some(terms.join(" "));
	}
}

fn add_internship_filters(query: &mut BoolQueryBuilder, params: &QueryParams, now: OffsetDateTime) {
	query.must_not.push(FilterClause::Terms {
		field: "state".to_string(),
		values: EXCLUDED_INTERNSHIP_STATES.iter().map(|state| state.to_string()).collect(),
	});

	add_terms(query, "community.id", params.values("program"), None);
	add_terms(query, "postingAgency", params.values("agency"), None);
	add_terms(query, "bureau.id", params.values("bureau"), None);
	add_terms(query, "office.id", params.values("office"), None);
	add_enrollment_window(query, now);

	let locations = params.values("location");

	if !locations.is_empty() {
		query.minimum_should_match = 1;
	}

	for location in locations {
		query.should.push(ShouldClause::MultiMatch {
			fields: POSTING_LOCATION_FIELDS.iter().map(|field| field.to_string()).collect(),
			query: strip_id_suffix(&location).to_string(),
		});
	}
}

fn add_listing_filters(query: &mut BoolQueryBuilder, params: &QueryParams) {
	let mut locations = params.values("location");

	locations.extend(params.values("locationType"));

	add_terms(query, "state", params.values("state"), Some(DEFAULT_STATE));
	add_terms(query, "locations.name", locations, None);
	add_terms(query, "agency.name", params.values("agency"), None);
	add_terms(query, "department.name", params.values("department"), None);
}

fn add_common_filters(query: &mut BoolQueryBuilder, params: &QueryParams) {
	let series = params.values("series").iter().map(|value| strip_series_suffix(value)).collect();

	add_terms(query, "community.id", params.values("community"), None);
	add_terms(query, "isInternship", params.values("isInternship"), None);
	add_terms(query, "skills.name", params.values("skill"), None);
	add_terms(query, "careers.id", params.values("career"), None);
	add_terms(query, "series.code", series, None);
	add_terms(query, "timeRequired", params.values("time"), None);
	add_terms(query, "languages.name", params.values("language"), None);
	add_terms(query, "payPlan.id", params.values("payPlan"), None);
	add_terms(query, "detailSelection", params.values("detailSelection"), None);
	add_terms(query, "grade", params.values("grade"), None);
}

fn add_enrollment_window(query: &mut BoolQueryBuilder, now: OffsetDateTime) {
	let now = format_instant(now);

	query
		.must
		.push(FilterClause::RangeGte { field: "cycle.applyEndDate".to_string(), value: now.clone() });
	query.must.push(FilterClause::RangeLte { field: "cycle.applyStartDate".to_string(), value: now });
}

/// Adds a mandatory `terms` clause unless the values (after `default`) are empty or `_all`.
fn add_terms(
	query: &mut BoolQueryBuilder,
	field: &str,
	values: Vec<String>,
	default: Option<&str>,
) {
	let values = match (values.is_empty(), default) {
		(true, Some(default)) => vec![default.to_string()],
		_ => values,
	};

	if values.is_empty() || (values.len() == 1 && values[0] == ALL_SENTINEL) {
		return;
	}

	query.must.push(FilterClause::Terms {
		field: field.to_string(),
		values: values.iter().map(|value| strip_id_suffix(value).to_string()).collect(),
	});
}

/// `"Engineering|42"` -> `"Engineering"`.
fn strip_id_suffix(value: &str) -> &str {
	value.split('|').next().unwrap_or(value)
}

/// `"GS-0801 (Engineer)"` -> `"GS-0801"`.
fn strip_series_suffix(value: &str) -> String {
	value.split('(').next().unwrap_or(value).trim().to_string()
}

fn format_instant(now: OffsetDateTime) -> String {
	now.format(&Rfc3339).unwrap_or_else(|_| (now.unix_timestamp_nanos() / 1_000_000).to_string())
}
