pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Search engine error: {message}")]
	SearchEngine { message: String },
	#[error("Mapping error at {path}: {message}")]
	Mapping { path: String, message: String },
}
impl From<opps_storage::Error> for Error {
	fn from(err: opps_storage::Error) -> Self {
		match err {
			opps_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			other => Self::SearchEngine { message: other.to_string() },
		}
	}
}
