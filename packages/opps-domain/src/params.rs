use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// One raw query parameter: a scalar, or a list when the key was repeated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, from = "RawParam")]
pub enum ParamValue {
	One(String),
	Many(Vec<String>),
}
impl ParamValue {
	/// Values as a list. A blank scalar counts as no value.
	pub fn values(&self) -> Vec<String> {
		match self {
			Self::One(value) if value.is_empty() => Vec::new(),
			Self::One(value) => vec![value.clone()],
			Self::Many(values) => values.clone(),
		}
	}

	pub fn first(&self) -> Option<&str> {
		match self {
			Self::One(value) => Some(value.as_str()),
			Self::Many(values) => values.first().map(String::as_str),
		}
	}

	pub fn is_empty(&self) -> bool {
		match self {
			Self::One(value) => value.is_empty(),
			Self::Many(values) => values.is_empty(),
		}
	}

	fn push(&mut self, value: String) {
		match self {
			Self::One(existing) => {
				let first = std::mem::take(existing);

				*self = Self::Many(vec![first, value]);
			},
			Self::Many(values) => values.push(value),
		}
	}
}
impl From<&str> for ParamValue {
	fn from(value: &str) -> Self {
		Self::One(value.to_string())
	}
}
impl From<String> for ParamValue {
	fn from(value: String) -> Self {
		Self::One(value)
	}
}
impl From<i64> for ParamValue {
	fn from(value: i64) -> Self {
		Self::One(value.to_string())
	}
}
impl From<Vec<&str>> for ParamValue {
	fn from(values: Vec<&str>) -> Self {
		Self::Many(values.into_iter().map(str::to_string).collect())
	}
}
impl From<Vec<String>> for ParamValue {
	fn from(values: Vec<String>) -> Self {
		Self::Many(values)
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
	Text(String),
	Number(Number),
	Bool(bool),
}
impl RawScalar {
	fn into_string(self) -> String {
		match self {
			Self::Text(text) => text,
			Self::Number(number) => number.to_string(),
			Self::Bool(flag) => flag.to_string(),
		}
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawParam {
	Scalar(RawScalar),
	List(Vec<RawScalar>),
}
impl From<RawParam> for ParamValue {
	fn from(raw: RawParam) -> Self {
		match raw {
			RawParam::Scalar(scalar) => Self::One(scalar.into_string()),
			RawParam::List(list) => Self::Many(list.into_iter().map(RawScalar::into_string).collect()),
		}
	}
}

/// Caller supplied query parameters, keyed by parameter name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, ParamValue>);
impl QueryParams {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds parameters from `key=value` pairs. A repeated key collects its values into a list.
	pub fn from_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let mut params = Self::new();

		for (key, value) in pairs {
			let key = key.into();
			let value = value.into();

			match params.0.get_mut(&key) {
				Some(existing) => existing.push(value),
				None => {
					params.0.insert(key, ParamValue::One(value));
				},
			}
		}

		params
	}

	pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
		self.insert(key, value);

		self
	}

	pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
		self.0.insert(key.to_string(), value.into());
	}

	pub fn get(&self, key: &str) -> Option<&ParamValue> {
		self.0.get(key)
	}

	pub fn values(&self, key: &str) -> Vec<String> {
		self.get(key).map(ParamValue::values).unwrap_or_default()
	}

	/// True when the key is present with at least one value.
	pub fn has(&self, key: &str) -> bool {
		self.get(key).map(|value| !value.is_empty()).unwrap_or(false)
	}

	/// First value parsed as an integer. Unparsable values count as absent.
	pub fn integer(&self, key: &str) -> Option<i64> {
		let raw = self.get(key)?.first()?.trim();

		raw.parse::<i64>().ok().or_else(|| {
			raw.parse::<f64>().ok().filter(|value| value.is_finite()).map(|value| value.trunc() as i64)
		})
	}
}

/// Identity of the authenticated caller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
	#[serde(default)]
	pub is_admin: bool,
	/// Agencies the caller belongs to. Empty for callers without an agency.
	#[serde(default)]
	pub agency_ids: Vec<String>,
}
impl CallerIdentity {
	pub fn has_agency(&self) -> bool {
		!self.agency_ids.is_empty()
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
	/// `None` for anonymous callers.
	pub user: Option<CallerIdentity>,
}
impl CallerContext {
	pub fn anonymous() -> Self {
		Self { user: None }
	}

	pub fn admin() -> Self {
		Self { user: Some(CallerIdentity { is_admin: true, agency_ids: Vec::new() }) }
	}

	pub fn member_of<I, S>(agency_ids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			user: Some(CallerIdentity {
				is_admin: false,
				agency_ids: agency_ids.into_iter().map(Into::into).collect(),
			}),
		}
	}
}

/// The `isInternship` parameter resolved once from its loose string form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InternshipFlag {
	Yes,
	No,
	Unspecified,
}
impl InternshipFlag {
	/// Numeric one (`"1"`, `"1.0"`, `" 1 "`) is `Yes`, any other number is `No`, anything that is
	/// not a single number is `Unspecified`.
	pub fn resolve(raw: Option<&ParamValue>) -> Self {
		let text = match raw {
			None => return Self::Unspecified,
			Some(ParamValue::One(value)) => value.as_str(),
			Some(ParamValue::Many(values)) if values.len() == 1 => values[0].as_str(),
			Some(ParamValue::Many(_)) => return Self::Unspecified,
		};
		let trimmed = text.trim();

		if trimmed.is_empty() {
			return Self::No;
		}

		match trimmed.parse::<f64>() {
			Ok(value) if value == 1.0 => Self::Yes,
			Ok(value) if value.is_nan() => Self::Unspecified,
			Ok(_) => Self::No,
			Err(_) => Self::Unspecified,
		}
	}

	pub fn is_yes(self) -> bool {
		matches!(self, Self::Yes)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn repeated_keys_collect_into_lists() {
		let params = QueryParams::from_pairs([("skill", "rust"), ("skill", "go"), ("page", "2")]);

		assert_eq!(params.get("skill"), Some(&ParamValue::Many(vec!["rust".into(), "go".into()])));
		assert_eq!(params.integer("page"), Some(2));
	}

	#[test]
	fn deserializes_numbers_and_lists() {
		let params: QueryParams = serde_json::from_value(serde_json::json!({
			"page": 3,
			"keywords": ["a", 1, true],
			"term": "chef"
		}))
		.expect("Failed to parse params.");

		assert_eq!(params.integer("page"), Some(3));
		assert_eq!(params.values("keywords"), vec!["a", "1", "true"]);
		assert_eq!(params.values("term"), vec!["chef"]);
	}

	#[test]
	fn internship_flag_follows_numeric_coercion() {
		assert_eq!(InternshipFlag::resolve(Some(&"1".into())), InternshipFlag::Yes);
		assert_eq!(InternshipFlag::resolve(Some(&" 1.0 ".into())), InternshipFlag::Yes);
		assert_eq!(InternshipFlag::resolve(Some(&vec!["1"].into())), InternshipFlag::Yes);
		assert_eq!(InternshipFlag::resolve(Some(&"0".into())), InternshipFlag::No);
		assert_eq!(InternshipFlag::resolve(Some(&"".into())), InternshipFlag::No);
		assert_eq!(InternshipFlag::resolve(Some(&"yes".into())), InternshipFlag::Unspecified);
		assert_eq!(InternshipFlag::resolve(Some(&vec!["1", "1"].into())), InternshipFlag::Unspecified);
		assert_eq!(InternshipFlag::resolve(None), InternshipFlag::Unspecified);
	}
}
