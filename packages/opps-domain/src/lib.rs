pub mod bulk;
pub mod params;
pub mod query;
pub mod result;

use std::{
	fmt::{Display, Formatter},
	str::FromStr,
};

use serde::{Deserialize, Serialize};

pub use bulk::{BulkOperation, IndexTarget};
pub use params::{CallerContext, CallerIdentity, InternshipFlag, ParamValue, QueryParams};
pub use query::{AccessScope, BoolQuery, FilterClause, SearchRequest, ShouldClause, SortKey, SortOrder};
pub use result::{RawHit, ResultModel, SearchHit, SearchResults};

/// The two record kinds kept in the search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
	Task,
	User,
}
impl RecordType {
	pub fn doc_type(self) -> &'static str {
		match self {
			Self::Task => "task",
			Self::User => "user",
		}
	}

	/// File name of the mapping document, relative to the configured mapping directory.
	pub fn mapping_file(self) -> &'static str {
		match self {
			Self::Task => "task_mapping.json",
			Self::User => "user_mapping.json",
		}
	}
}
impl Display for RecordType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.doc_type())
	}
}
impl FromStr for RecordType {
	type Err = UnknownRecordType;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"task" | "tasks" | "opportunity" | "opportunities" => Ok(Self::Task),
			"user" | "users" => Ok(Self::User),
			_ => Err(UnknownRecordType(raw.to_string())),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRecordType(pub String);
impl Display for UnknownRecordType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "unknown record type '{}', expected task or user", self.0)
	}
}
impl std::error::Error for UnknownRecordType {}
