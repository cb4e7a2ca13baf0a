//! Read side of the video index: frames and detected objects with their embeddings, restricted to
//! one source and time window.

use sqlx::PgPool;
use time::OffsetDateTime;

use argus_domain::candidate::{FrameCandidate, ObjectCandidate, ObjectType};

use crate::{
	Error, Result,
	models::{FrameRow, ObjectRow},
};

const FRAME_CANDIDATES_SQL: &str = "\
SELECT
	e.frame_id AS frame_id,
	f.timestamp_sec::float8 AS timestamp_sec,
	e.vector::text AS vector
FROM embeddings e
JOIN frames f ON e.frame_id = f.id
WHERE e.entity_type = 'FRAME'
	AND f.source_id = $1
	AND f.at >= $2
	AND f.at <= $3
ORDER BY f.timestamp_sec
LIMIT $4";

const OBJECT_CANDIDATES_SQL: &str = "\
SELECT
	e.object_id AS object_id,
	o.frame_id AS frame_id,
	o.type::text AS object_type,
	o.track_id::bigint AS track_id,
	f.timestamp_sec::float8 AS timestamp_sec,
	e.vector::text AS vector,
	ta.color_hsv AS color_hsv,
	ta.license_plate AS license_plate,
	pa.upper_color_hsv AS upper_color_hsv,
	pa.lower_color_hsv AS lower_color_hsv
FROM embeddings e
JOIN objects o ON e.object_id = o.id
JOIN frames f ON o.frame_id = f.id
LEFT JOIN transport_attrs ta ON o.id = ta.object_id
LEFT JOIN person_attrs pa ON o.id = pa.object_id
WHERE e.entity_type = 'OBJECT'
	AND f.source_id = $1
	AND f.at >= $2
	AND f.at <= $3
	AND o.type::text = $4
ORDER BY f.timestamp_sec
LIMIT $5";

#[derive(Clone)]
pub struct CandidateStore {
	pool: PgPool,
}
impl CandidateStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	/// Frames of `source_id` inside `[start, end]`, ordered by timestamp and capped at `limit`.
	/// Rows with an unparseable vector are omitted.
	pub async fn fetch_frames(
		&self,
		source_id: &str,
		start: OffsetDateTime,
		end: OffsetDateTime,
		limit: u32,
	) -> Result<Vec<FrameCandidate>> {
		validate_window(source_id, start, end)?;

		let rows = sqlx::query_as::<_, FrameRow>(FRAME_CANDIDATES_SQL)
			.bind(source_id)
			.bind(start)
			.bind(end)
			.bind(i64::from(limit))
			.fetch_all(&self.pool)
			.await?;
		let fetched = rows.len();
		let mut candidates = Vec::with_capacity(fetched);

		for row in rows {
			let frame_id = row.frame_id;

			match row.into_candidate() {
				Some(candidate) => candidates.push(candidate),
				None => tracing::warn!(%frame_id, "Skipping frame with unparseable vector."),
			}
		}

		tracing::debug!(source_id, fetched, kept = candidates.len(), "Fetched frame candidates.");

		Ok(candidates)
	}

	/// Objects of `object_type` in frames of `source_id` inside `[start, end]`, with their vehicle
	/// or garment attributes. Ordering and omission rules match [`Self::fetch_frames`].
	pub async fn fetch_objects(
		&self,
		source_id: &str,
		start: OffsetDateTime,
		end: OffsetDateTime,
		object_type: ObjectType,
		limit: u32,
	) -> Result<Vec<ObjectCandidate>> {
		validate_window(source_id, start, end)?;

		let rows = sqlx::query_as::<_, ObjectRow>(OBJECT_CANDIDATES_SQL)
			.bind(source_id)
			.bind(start)
			.bind(end)
			.bind(object_type.as_str())
			.bind(i64::from(limit))
			.fetch_all(&self.pool)
			.await?;
		let fetched = rows.len();
		let mut candidates = Vec::with_capacity(fetched);

		for row in rows {
			let object_id = row.object_id;

			match row.into_candidate() {
				Some(candidate) => candidates.push(candidate),
				None => tracing::warn!(%object_id, "Skipping object with unparseable vector or type."),
			}
		}

		tracing::debug!(
			source_id,
			object_type = object_type.as_str(),
			fetched,
			kept = candidates.len(),
			"Fetched object candidates."
		);

		Ok(candidates)
	}
}

fn validate_window(source_id: &str, start: OffsetDateTime, end: OffsetDateTime) -> Result<()> {
	if source_id.trim().is_empty() {
		return Err(Error::InvalidArgument("source_id must be non-empty.".to_string()));
	}
	if end < start {
		return Err(Error::InvalidArgument("Window end must not precede window start.".to_string()));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	#[test]
	fn window_must_be_ordered() {
		let start = datetime!(2025-03-01 10:00 UTC);
		let end = datetime!(2025-03-01 09:00 UTC);

		assert!(validate_window("cam-1", start, start).is_ok());
		assert!(matches!(validate_window("cam-1", start, end), Err(Error::InvalidArgument(_))));
		assert!(matches!(validate_window("  ", end, start), Err(Error::InvalidArgument(_))));
	}
}
