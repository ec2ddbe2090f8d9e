use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result field name paired with the source document field it is copied from.
pub const RESULT_FIELDS: [(&str, &str); 34] = [
	("id", "id"),
	("title", "title"),
	("status", "state"),
	("description", "description"),
	("details", "details"),
	("outcome", "outcome"),
	("about", "about"),
	("grade", "grade"),
	("agencyId", "agencyId"),
	("agencyName", "agencyName"),
	("restrictedToAgency", "restrictedToAgency"),
	("requester", "requester"),
	("publishedAt", "publishedAt"),
	("postingAgency", "postingAgency"),
	("acceptingApplicants", "acceptingApplicants"),
	("taskPeople", "taskPeople"),
	("timeRequired", "timeRequired"),
	("timeEstimate", "timeEstimate"),
	("taskLength", "taskLength"),
	("skills", "skills"),
	("locationType", "locationType"),
	("locations", "locations"),
	("postingLocation", "postingLocation"),
	("series", "series"),
	("careers", "careers"),
	("keywords", "keywords"),
	("owner", "owner"),
	("community", "community"),
	("detailSelection", "detailSelection"),
	("bureau", "bureau"),
	("office", "office"),
	("payPlan", "payPlan"),
	("agency", "agency"),
	("ownerName", "ownerName"),
];

/// One hit as returned by the search engine.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SearchHit {
	#[serde(rename = "_id", default)]
	pub id: Option<String>,
	#[serde(rename = "_score", default)]
	pub score: Option<f64>,
	#[serde(rename = "_source", default)]
	pub source: Value,
}

/// Sparse, allow-listed projection of a task hit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultModel {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub score: Option<f64>,
	pub result: Map<String, Value>,
}

/// Unprojected hit, used for user searches.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RawHit {
	pub score: Option<f64>,
	pub result: Value,
}
impl From<SearchHit> for RawHit {
	fn from(hit: SearchHit) -> Self {
		Self { score: hit.score, result: hit.source }
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchResults<T> {
	pub total_hits: u64,
	pub hits: Vec<T>,
}

pub fn project(hit: &SearchHit) -> ResultModel {
	let mut result = Map::new();

	if let Some(source) = hit.source.as_object() {
		for (target, field) in RESULT_FIELDS {
			if let Some(value) = source.get(field) {
				result.insert(target.to_string(), value.clone());
			}
		}
	}

	remove_empty_fields(&mut result);

	ResultModel { score: hit.score.filter(|score| score.is_finite()), result }
}

/// Drops empty arrays and nulls from `object`, descending into nested objects and arrays.
pub fn remove_empty_fields(object: &mut Map<String, Value>) {
	object.retain(|_, value| match value {
		Value::Null => false,
		Value::Array(items) => !items.is_empty(),
		_ => true,
	});

	for value in object.values_mut() {
		remove_empty(value);
	}
}

fn remove_empty(value: &mut Value) {
	match value {
		Value::Object(object) => remove_empty_fields(object),
		Value::Array(items) => {
			for item in items {
				remove_empty(item);
			}
		},
		_ => {},
	}
}
