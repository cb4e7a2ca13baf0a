use std::env;

use time::macros::datetime;
use uuid::Uuid;

use argus_config::Postgres;
use argus_domain::candidate::{ObjectAttributes, ObjectType};
use argus_storage::{candidates::CandidateStore, db::Db};

const TEMP_SCHEMA: &[&str] = &[
	"CREATE TEMP TABLE frames (id uuid PRIMARY KEY, timestamp_sec double precision NOT NULL, source_id text NOT NULL, at timestamptz NOT NULL)",
	"CREATE TEMP TABLE objects (id uuid PRIMARY KEY, frame_id uuid NOT NULL, type text NOT NULL, track_id integer)",
	"CREATE TEMP TABLE embeddings (id uuid PRIMARY KEY, entity_type text NOT NULL, frame_id uuid, object_id uuid, vector text)",
	"CREATE TEMP TABLE transport_attrs (id uuid PRIMARY KEY, object_id uuid NOT NULL, color_hsv text, license_plate text)",
	"CREATE TEMP TABLE person_attrs (id uuid PRIMARY KEY, object_id uuid NOT NULL, upper_color_hsv text, lower_color_hsv text)",
];

fn env_dsn() -> Option<String> {
	env::var("ARGUS_PG_DSN").ok().filter(|dsn| !dsn.trim().is_empty())
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ARGUS_PG_DSN to run."]
async fn fetches_window_candidates_in_timestamp_order() {
	let Some(dsn) = env_dsn() else {
		eprintln!("Skipping fetches_window_candidates_in_timestamp_order; set ARGUS_PG_DSN.");

		return;
	};
	// One connection so the temporary tables stay visible to every query.
	let db = Db::connect(&Postgres { dsn, pool_max_conns: 1 })
		.await
		.expect("Failed to connect to Postgres.");

	for statement in TEMP_SCHEMA {
		sqlx::query(statement).execute(&db.pool).await.expect("Failed to create temp table.");
	}

	let early = Uuid::new_v4();
	let late = Uuid::new_v4();
	let outside = Uuid::new_v4();
	let frames = [
		(late, 20.0, "cam-1", datetime!(2025-03-01 10:20 UTC)),
		(early, 10.0, "cam-1", datetime!(2025-03-01 10:10 UTC)),
		(outside, 5.0, "cam-1", datetime!(2025-03-02 10:00 UTC)),
	];

	for (id, ts, source, at) in frames {
		sqlx::query("INSERT INTO frames (id, timestamp_sec, source_id, at) VALUES ($1, $2, $3, $4)")
			.bind(id)
			.bind(ts)
			.bind(source)
			.bind(at)
			.execute(&db.pool)
			.await
			.expect("Failed to insert frame.");
		sqlx::query(
			"INSERT INTO embeddings (id, entity_type, frame_id, vector) VALUES ($1, 'FRAME', $2, $3)",
		)
		.bind(Uuid::new_v4())
		.bind(id)
		.bind("[1.0, 0.0]")
		.execute(&db.pool)
		.await
		.expect("Failed to insert frame embedding.");
	}

	let car = Uuid::new_v4();
	let broken = Uuid::new_v4();

	for (object_id, vector) in [(car, "[0.0, 1.0]"), (broken, "not a vector")] {
		sqlx::query("INSERT INTO objects (id, frame_id, type, track_id) VALUES ($1, $2, 'TRANSPORT', 4)")
			.bind(object_id)
			.bind(early)
			.execute(&db.pool)
			.await
			.expect("Failed to insert object.");
		sqlx::query(
			"INSERT INTO embeddings (id, entity_type, object_id, vector) VALUES ($1, 'OBJECT', $2, $3)",
		)
		.bind(Uuid::new_v4())
		.bind(object_id)
		.bind(vector)
		.execute(&db.pool)
		.await
		.expect("Failed to insert object embedding.");
	}

	sqlx::query(
		"INSERT INTO transport_attrs (id, object_id, color_hsv, license_plate) VALUES ($1, $2, '0,0.9,0.6', 'A123BC77')",
	)
	.bind(Uuid::new_v4())
	.bind(car)
	.execute(&db.pool)
	.await
	.expect("Failed to insert transport attributes.");

	let store = CandidateStore::new(db.pool.clone());
	let start = datetime!(2025-03-01 10:00 UTC);
	let end = datetime!(2025-03-01 11:00 UTC);
	let frames = store.fetch_frames("cam-1", start, end, 10).await.expect("frames");

	assert_eq!(frames.iter().map(|f| f.frame_id).collect::<Vec<_>>(), vec![early, late]);

	let capped = store.fetch_frames("cam-1", start, end, 1).await.expect("frames");

	assert_eq!(capped.len(), 1);

	let objects = store
		.fetch_objects("cam-1", start, end, ObjectType::Transport, 10)
		.await
		.expect("objects");

	assert_eq!(objects.len(), 1);
	assert_eq!(objects[0].object_id, car);
	assert_eq!(objects[0].track_id, Some(4));
	assert_eq!(
		objects[0].attributes,
		ObjectAttributes::Transport {
			color_hsv: Some("0,0.9,0.6".to_string()),
			plate: Some("A123BC77".to_string()),
		}
	);

	let people =
		store.fetch_objects("cam-1", start, end, ObjectType::Person, 10).await.expect("objects");

	assert!(people.is_empty());
}
