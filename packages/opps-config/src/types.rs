use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub elastic: Elastic,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Elastic {
	pub url: String,
	/// Optional. Sent as `Authorization: ApiKey <value>` when set.
	#[serde(default)]
	pub api_key: Option<String>,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default = "default_task_index")]
	pub task_index: String,
	#[serde(default = "default_user_index")]
	pub user_index: String,
	/// Directory holding `task_mapping.json` and `user_mapping.json`.
	#[serde(default = "default_mapping_dir")]
	pub mapping_dir: PathBuf,
}

fn default_timeout_ms() -> u64 {
	10_000
}

fn default_task_index() -> String {
	"task".to_string()
}

fn default_user_index() -> String {
	"user".to_string()
}

fn default_mapping_dir() -> PathBuf {
	PathBuf::from("mappings")
}
