use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use opps_domain::{CallerContext, QueryParams, RecordType};
use opps_service::OppsService;
use opps_storage::{db::Db, elastic::ElasticStore};

#[derive(Debug, Parser)]
#[command(
	version = opps_cli::VERSION,
	rename_all = "kebab",
	styles = opps_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Index every record of a type.
	Reindex { record_type: RecordType },
	/// Apply the mapping file to an existing index, then reindex every record of a type.
	Remap { record_type: RecordType },
	ReindexCycle { cycle_id: String },
	ReindexAgency { agency_id: String },
	ReindexCommunity { community_id: String },
	/// Remove every task of a community from the index.
	DeleteCommunity { community_id: String },
	/// Index one record. Prints `null` when the search engine is not alive.
	Index { record_type: RecordType, id: String },
	/// Delete one record. Prints `null` when the search engine is not alive.
	Delete { record_type: RecordType, id: String },
	/// Search tasks with `key=value` parameters. Repeat a key to pass a list.
	Search {
		#[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
		params: Vec<(String, String)>,
		#[arg(long)]
		admin: bool,
		#[arg(long = "agency", value_name = "ID")]
		agencies: Vec<String>,
	},
	/// List users in the user index.
	SearchUsers,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = opps_config::load(&args.config)?;

	init_tracing(&config);

	tracing::info!(
		command = ?args.command,
		elastic_url = %config.storage.elastic.url,
		"Running indexer command."
	);

	let db = Db::connect(&config.storage.postgres).await?;
	let elastic = ElasticStore::new(&config.storage.elastic)?;
	let service = OppsService::new(config, db, elastic);

	match args.command {
		Command::Reindex { record_type } => print_json(&service.reindex_all(record_type).await?),
		Command::Remap { record_type } => print_json(&service.remap(record_type).await?),
		Command::ReindexCycle { cycle_id } =>
			print_json(&service.reindex_cycle(&cycle_id).await?),
		Command::ReindexAgency { agency_id } =>
			print_json(&service.reindex_agency(&agency_id).await?),
		Command::ReindexCommunity { community_id } =>
			print_json(&service.reindex_community(&community_id).await?),
		Command::DeleteCommunity { community_id } =>
			print_json(&service.delete_community(&community_id).await?),
		Command::Index { record_type, id } =>
			print_json(&service.index_one(record_type, &id).await?),
		Command::Delete { record_type, id } =>
			print_json(&service.delete_one(record_type, &id).await?),
		Command::Search { params, admin, agencies } => {
			let params = QueryParams::from_pairs(params);
			let caller = caller_context(admin, agencies);

			print_json(&service.search(&params, &caller).await?)
		},
		Command::SearchUsers => print_json(&service.search_users(None).await?),
	}
}

fn init_tracing(config: &opps_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn caller_context(admin: bool, agencies: Vec<String>) -> CallerContext {
	if admin {
		CallerContext::admin()
	} else if agencies.is_empty() {
		CallerContext::anonymous()
	} else {
		CallerContext::member_of(agencies)
	}
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
	let (key, value) =
		raw.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
	let key = key.trim();

	if key.is_empty() {
		return Err(format!("parameter name is empty in '{raw}'"));
	}

	Ok((key.to_string(), value.to_string()))
}

fn print_json<T>(value: &T) -> color_eyre::Result<()>
where
	T: Serialize,
{
	println!("{}", serde_json::to_string_pretty(value)?);

	Ok(())
}
