pub mod search;
pub mod time_serde;

mod error;

pub use error::{Error, Result};
pub use search::{SearchRequest, SearchResponse, SearchService, SearchStage};

use std::{future::Future, pin::Pin};

use time::OffsetDateTime;

use argus_config::EmbeddingProviderConfig;
use argus_domain::candidate::{FrameCandidate, ObjectCandidate, ObjectType};
use argus_providers::embedding;
use argus_storage::candidates::CandidateStore;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Turns query text into a vector in the same space as the stored candidate embeddings.
pub trait Embedder
where
	Self: Send + Sync,
{
	fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>>;
}

/// Bulk candidate fetch for one source and time window. Both calls return at most `limit` items
/// ordered by timestamp ascending and omit rows whose stored vector cannot be parsed.
pub trait CandidateSource
where
	Self: Send + Sync,
{
	fn fetch_frames<'a>(
		&'a self,
		source_id: &'a str,
		start: OffsetDateTime,
		end: OffsetDateTime,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<FrameCandidate>>>;

	fn fetch_objects<'a>(
		&'a self,
		source_id: &'a str,
		start: OffsetDateTime,
		end: OffsetDateTime,
		object_type: ObjectType,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<ObjectCandidate>>>;
}

/// [`Embedder`] backed by the configured HTTP embedding provider.
pub struct HttpEmbedder {
	cfg: EmbeddingProviderConfig,
}
impl HttpEmbedder {
	pub fn new(cfg: EmbeddingProviderConfig) -> Self {
		Self { cfg }
	}
}

impl Embedder for HttpEmbedder {
	fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async move {
			let texts = [text.to_string()];
			let mut vectors = embedding::embed(&self.cfg, &texts).await.map_err(|err| {
				tracing::warn!(
					provider_id = %self.cfg.provider_id,
					model = %self.cfg.model,
					error = %err,
					"Embedding request failed."
				);

				Error::Provider { message: format!("{}: {err}", self.cfg.provider_id) }
			})?;

			vectors.pop().ok_or_else(|| Error::Provider {
				message: format!("{}: no vectors returned.", self.cfg.provider_id),
			})
		})
	}
}

impl CandidateSource for CandidateStore {
	fn fetch_frames<'a>(
		&'a self,
		source_id: &'a str,
		start: OffsetDateTime,
		end: OffsetDateTime,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<FrameCandidate>>> {
		Box::pin(async move {
			Ok(CandidateStore::fetch_frames(self, source_id, start, end, limit).await?)
		})
	}

	fn fetch_objects<'a>(
		&'a self,
		source_id: &'a str,
		start: OffsetDateTime,
		end: OffsetDateTime,
		object_type: ObjectType,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<ObjectCandidate>>> {
		Box::pin(async move {
			Ok(CandidateStore::fetch_objects(self, source_id, start, end, object_type, limit).await?)
		})
	}
}
