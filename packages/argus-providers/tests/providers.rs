use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};

use argus_config::EmbeddingProviderConfig;

#[test]
fn builds_bearer_auth_header() {
	let headers =
		argus_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn includes_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-tenant".to_string(), Value::String("cams".to_string()));

	let headers = argus_providers::auth_headers("secret", &defaults).expect("headers");

	assert_eq!(headers.get("x-tenant").expect("Missing default header."), "cams");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-retries".to_string(), Value::from(3));

	let err = argus_providers::auth_headers("secret", &defaults).expect_err("expected error");

	assert!(matches!(err, argus_providers::Error::InvalidConfig { .. }));
}

#[tokio::test]
async fn unreachable_endpoint_surfaces_transport_error() {
	let cfg = EmbeddingProviderConfig {
		provider_id: "local".to_string(),
		api_base: "http://127.0.0.1:9".to_string(),
		api_key: "key".to_string(),
		path: "/v1/embeddings".to_string(),
		model: "clip".to_string(),
		dimensions: 4,
		timeout_ms: 500,
		default_headers: Map::new(),
	};
	let err = argus_providers::embedding::embed(&cfg, &["red car".to_string()])
		.await
		.expect_err("expected error");

	assert!(matches!(err, argus_providers::Error::Reqwest(_)));
}
