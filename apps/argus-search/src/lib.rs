//! One-shot text search over a camera source. Prints one JSON object per hit on stdout.

use std::{
	io::{self, Write},
	path::PathBuf,
	sync::Arc,
};

use clap::Parser;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing_subscriber::EnvFilter;

use argus_service::{HttpEmbedder, SearchRequest, SearchService};
use argus_storage::{candidates::CandidateStore, db::Db};

#[derive(Debug, Parser)]
#[command(
	version = argus_cli::VERSION,
	rename_all = "kebab",
	styles = argus_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Camera source identifier.
	#[arg(long, short = 's', value_name = "ID")]
	pub source: String,
	/// Window start, RFC 3339.
	#[arg(long, value_name = "TIME", value_parser = parse_rfc3339)]
	pub start: OffsetDateTime,
	/// Window end, RFC 3339.
	#[arg(long, value_name = "TIME", value_parser = parse_rfc3339)]
	pub end: OffsetDateTime,
	#[arg(long, value_name = "SCORE")]
	pub embed_sim_min: Option<f32>,
	#[arg(long, value_name = "SCORE")]
	pub final_min: Option<f32>,
	#[arg(long, value_name = "N")]
	pub max_candidates: Option<u32>,
	#[arg(long, value_name = "MS")]
	pub timeout_ms: Option<u64>,
	/// Free-text query, e.g. `red car a123bc77`.
	#[arg(required = true, num_args = 1.., value_name = "QUERY")]
	pub query: Vec<String>,
}
impl Args {
	pub fn request(&self) -> SearchRequest {
		let mut req = SearchRequest::new(self.query.join(" "), &self.source, self.start, self.end);

		req.embed_sim_min = self.embed_sim_min;
		req.final_min = self.final_min;
		req.max_candidates = self.max_candidates;
		req.timeout_ms = self.timeout_ms;

		req
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = argus_config::load(&args.config)?;

	init_tracing(&config);

	let db = Db::connect(&config.storage.postgres).await?;
	let service = SearchService::new(
		config.search.clone(),
		Arc::new(HttpEmbedder::new(config.providers.embedding.clone())),
		Arc::new(CandidateStore::new(db.pool.clone())),
	);
	let response = service.search(&args.request()).await?;

	tracing::info!(
		stage = ?response.stage,
		candidates = response.candidate_count,
		hits = response.hits.len(),
		"Search finished."
	);

	let mut stdout = io::stdout().lock();

	for hit in &response.hits {
		serde_json::to_writer(&mut stdout, hit)?;
		stdout.write_all(b"\n")?;
	}

	stdout.flush()?;

	Ok(())
}

fn init_tracing(config: &argus_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn parse_rfc3339(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
	OffsetDateTime::parse(raw, &Rfc3339)
}
