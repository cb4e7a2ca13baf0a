use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Defaults for the ranking engine. Every field can be overridden per request.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Search {
	/// Minimum embedding similarity a hit must reach at every relaxation level.
	pub embed_sim_min: f32,
	/// Initial final-score threshold, lowered by `relax_step` when nothing passes.
	pub final_min: f32,
	/// Upper bound on candidates fetched for one search.
	pub max_candidates: u32,
	pub relax_step: f32,
	/// Number of hits returned by the embedding-only fallback.
	pub fallback_top_k: u32,
	/// Deadline shared by the embedding call and the candidate fetch.
	pub timeout_ms: u64,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			embed_sim_min: 0.30,
			final_min: 0.30,
			max_candidates: 2_000,
			relax_step: 0.10,
			fallback_top_k: 5,
			timeout_ms: 30_000,
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}
