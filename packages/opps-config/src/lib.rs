mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Elastic, Postgres, Service, Storage};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	let elastic = &cfg.storage.elastic;

	if elastic.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.elastic.url must be non-empty.".to_string(),
		});
	}
	if elastic.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "storage.elastic.timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (label, index) in [
		("storage.elastic.task_index", &elastic.task_index),
		("storage.elastic.user_index", &elastic.user_index),
	] {
		if index.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if elastic.task_index == elastic.user_index {
		return Err(Error::Validation {
			message: "storage.elastic.task_index and storage.elastic.user_index must differ."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let elastic = &mut cfg.storage.elastic;

	if elastic.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		elastic.api_key = None;
	}

	elastic.url = elastic.url.trim_end_matches('/').to_string();
}
