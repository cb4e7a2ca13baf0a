//! Text search over one source and time window.
//!
//! A search parses the query, embeds its cleaned text, fetches candidates (frames for untyped
//! queries, objects of the detected type otherwise), scores them, and selects the hits through a
//! strict pass, then progressively relaxed `final_min` levels, then an embedding-only fallback.

pub mod ranking;

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::time::{Instant, timeout_at};

use argus_config::Search;
use argus_domain::{
	candidate::SearchHit,
	query::{self, ParsedQuery},
	score::HitFilter,
	vector,
};

use crate::{BoxFuture, CandidateSource, Embedder, Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	pub source_id: String,
	#[serde(with = "crate::time_serde")]
	pub window_start: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub window_end: OffsetDateTime,
	/// Overrides `search.embed_sim_min`.
	#[serde(default)]
	pub embed_sim_min: Option<f32>,
	/// Overrides `search.final_min`.
	#[serde(default)]
	pub final_min: Option<f32>,
	#[serde(default)]
	pub max_candidates: Option<u32>,
	/// Deadline covering both the embedding call and the candidate fetch.
	#[serde(default)]
	pub timeout_ms: Option<u64>,
}
impl SearchRequest {
	pub fn new(
		query: impl Into<String>,
		source_id: impl Into<String>,
		window_start: OffsetDateTime,
		window_end: OffsetDateTime,
	) -> Self {
		Self {
			query: query.into(),
			source_id: source_id.into(),
			window_start,
			window_end,
			embed_sim_min: None,
			final_min: None,
			max_candidates: None,
			timeout_ms: None,
		}
	}
}

/// How the returned hits were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchStage {
	/// The requested thresholds admitted at least one hit.
	Strict,
	/// Admitted after lowering the final-score threshold to `final_min`.
	Relaxed { final_min: f32 },
	/// No threshold admitted anything; hits are the best candidates by embedding similarity.
	Fallback,
	/// The window held no usable candidates.
	Empty,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
	pub query: ParsedQuery,
	pub stage: SearchStage,
	/// Candidates that were scored, after skipping unusable vectors.
	pub candidate_count: usize,
	pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Copy)]
struct ResolvedSearch {
	embed_sim_min: f32,
	final_min: f32,
	max_candidates: u32,
	timeout_ms: u64,
}

/// The ranking engine. Holds no per-search state, so one instance serves concurrent searches.
pub struct SearchService {
	pub cfg: Search,
	pub embedder: Arc<dyn Embedder>,
	pub candidates: Arc<dyn CandidateSource>,
}
impl SearchService {
	pub fn new(
		cfg: Search,
		embedder: Arc<dyn Embedder>,
		candidates: Arc<dyn CandidateSource>,
	) -> Self {
		Self { cfg, embedder, candidates }
	}

	pub async fn search(&self, req: &SearchRequest) -> Result<SearchResponse> {
		let resolved = self.resolve(req)?;
		let parsed = query::parse(&req.query);

		if parsed.cleaned_text.is_empty() {
			return Err(Error::InvalidRequest {
				message: "Query has no text left to embed.".to_string(),
			});
		}

		let deadline = Instant::now() + Duration::from_millis(resolved.timeout_ms);
		let query_vec = with_deadline(
			"embedding",
			deadline,
			resolved.timeout_ms,
			self.embedder.embed(&parsed.cleaned_text),
		)
		.await?;

		if query_vec.is_empty() || !vector::is_finite_vector(&query_vec) {
			return Err(Error::Provider {
				message: "Embedder returned an empty or non-finite vector.".to_string(),
			});
		}

		let hits = match parsed.object_type {
			None => {
				let frames = with_deadline(
					"candidate fetch",
					deadline,
					resolved.timeout_ms,
					self.candidates.fetch_frames(
						&req.source_id,
						req.window_start,
						req.window_end,
						resolved.max_candidates,
					),
				)
				.await?;

				ranking::score_frames(&query_vec, &frames)
			},
			Some(object_type) => {
				let objects = with_deadline(
					"candidate fetch",
					deadline,
					resolved.timeout_ms,
					self.candidates.fetch_objects(
						&req.source_id,
						req.window_start,
						req.window_end,
						object_type,
						resolved.max_candidates,
					),
				)
				.await?;

				ranking::score_objects(&parsed, &query_vec, &objects)
			},
		};
		let filter = HitFilter::for_query(&parsed, resolved.embed_sim_min, resolved.final_min);
		let levels = ranking::relaxation_levels(resolved.final_min, self.cfg.relax_step);
		let (selected, stage) =
			ranking::select(&hits, filter, &levels, self.cfg.fallback_top_k as usize);

		match stage {
			SearchStage::Relaxed { final_min } => tracing::info!(
				source_id = %req.source_id,
				requested_final_min = resolved.final_min,
				final_min,
				hits = selected.len(),
				"Relaxed final score threshold."
			),
			SearchStage::Fallback => tracing::info!(
				source_id = %req.source_id,
				candidates = hits.len(),
				hits = selected.len(),
				"No threshold admitted a hit. Returning embedding fallback."
			),
			SearchStage::Strict | SearchStage::Empty => {},
		}

		tracing::debug!(
			source_id = %req.source_id,
			object_type = parsed.object_type.map(|t| t.as_str()),
			has_color = parsed.has_color(),
			has_plate = parsed.has_plate(),
			candidates = hits.len(),
			hits = selected.len(),
			"Search completed."
		);

		Ok(SearchResponse { query: parsed, stage, candidate_count: hits.len(), hits: selected })
	}

	fn resolve(&self, req: &SearchRequest) -> Result<ResolvedSearch> {
		if req.source_id.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "source_id must be non-empty.".to_string() });
		}
		if req.window_end < req.window_start {
			return Err(Error::InvalidRequest {
				message: "window_end must not precede window_start.".to_string(),
			});
		}

		let embed_sim_min = req.embed_sim_min.unwrap_or(self.cfg.embed_sim_min);
		let final_min = req.final_min.unwrap_or(self.cfg.final_min);
		let max_candidates = req.max_candidates.unwrap_or(self.cfg.max_candidates);
		let timeout_ms = req.timeout_ms.unwrap_or(self.cfg.timeout_ms);

		argus_config::validate_unit_interval("embed_sim_min", embed_sim_min)?;
		argus_config::validate_unit_interval("final_min", final_min)?;

		if max_candidates == 0 {
			return Err(Error::InvalidRequest {
				message: "max_candidates must be greater than zero.".to_string(),
			});
		}
		if timeout_ms == 0 {
			return Err(Error::InvalidRequest {
				message: "timeout_ms must be greater than zero.".to_string(),
			});
		}

		Ok(ResolvedSearch { embed_sim_min, final_min, max_candidates, timeout_ms })
	}
}

async fn with_deadline<T>(
	stage: &'static str,
	deadline: Instant,
	timeout_ms: u64,
	fut: BoxFuture<'_, Result<T>>,
) -> Result<T> {
	match timeout_at(deadline, fut).await {
		Ok(result) => result,
		Err(_) => Err(Error::Timeout { stage, timeout_ms }),
	}
}
