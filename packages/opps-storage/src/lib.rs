pub mod db;
pub mod elastic;
pub mod sources;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
