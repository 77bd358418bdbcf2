//! Integration tests for the per-IDP refresh loop against mock upstream endpoints.

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use jwks_aggregator::{Refresher, Registry, config::IdpConfig};
use serde_json::json;
use tokio::{sync::broadcast, time};
use url::Url;
use wiremock::{
	Mock, MockServer, ResponseTemplate,
	matchers::{method, path},
};

const JWKS_BODY: &str = r#"{
    "keys": [
        {
            "kty": "RSA",
            "alg": "RS256",
            "use": "sig",
            "kid": "primary",
            "n": "AQIDBAUGBwgJCgsMDQ4PEBESExQVFhcYGRobHB0eHyAhIiMkJSYnKCkqKywtLi8wMTIzNDU2Nzg5Ojs8PT4_QEFCQ0RFRkdISUpLTE1OT1BRUlNUVVZXWFlaW1xdXl9gYWJjZGVmZ2hpamtsbW5vcHFyc3R1dnd4eXp7fH1-f4A",
            "e": "AQAB"
        },
        {
            "kty": "EC",
            "alg": "ES256",
            "use": "sig",
            "kid": "secondary",
            "crv": "P-256",
            "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
            "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0"
        }
    ]
}"#;

fn idp_config(name: &str, url: &str, max_keys: usize, cache_duration: u64) -> IdpConfig {
	IdpConfig {
		name: name.into(),
		url: Url::parse(url).expect("url"),
		refresh_interval: 3600,
		max_keys,
		cache_duration,
	}
}

fn oversized_body(count: usize) -> String {
	let keys: Vec<_> = (0..count)
		.map(|index| json!({ "kty": "RSA", "kid": format!("key-{index}"), "e": "AQAB" }))
		.collect();

	json!({ "keys": keys }).to_string()
}

#[tokio::test]
async fn startup_fetch_publishes_keys_and_respects_a_fast_rotating_upstream() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path("/jwks.json"))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_string(JWKS_BODY)
				.insert_header("content-type", "application/json")
				.insert_header("cache-control", "public, max-age=300"),
		)
		.expect(1)
		.mount(&server)
		.await;

	let registry = Registry::new(["auth0"]);
	let config = idp_config("auth0", &format!("{}/jwks.json", server.uri()), 10, 900);
	let refresher = Refresher::new(config, registry.clone()).expect("refresher");

	refresher.refresh_once().await;

	let state = registry.get("auth0").await.expect("state");

	assert!(state.is_loaded());
	assert_eq!(state.update_count, 1);
	assert_eq!(state.key_count, 2);
	assert_eq!(state.idp_suggested_cache, 300);
	assert_eq!(state.cache_duration, 300, "upstream rotation should undercut the operator floor");
	assert!(state.last_error.is_empty());

	server.verify().await;
}

#[tokio::test]
async fn operator_floor_caps_a_lax_upstream_suggestion() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path("/jwks.json"))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_string(JWKS_BODY)
				.insert_header("cache-control", "public, max-age=86400"),
		)
		.mount(&server)
		.await;

	let registry = Registry::new(["auth0"]);
	let config = idp_config("auth0", &format!("{}/jwks.json", server.uri()), 10, 900);
	let refresher = Refresher::new(config, registry.clone()).expect("refresher");

	refresher.refresh_once().await;

	let state = registry.get("auth0").await.expect("state");

	assert_eq!(state.idp_suggested_cache, 86400);
	assert_eq!(state.cache_duration, 900);
}

#[tokio::test]
async fn oversized_keysets_are_truncated_in_upstream_order() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path("/jwks.json"))
		.respond_with(ResponseTemplate::new(200).set_body_string(oversized_body(25)))
		.mount(&server)
		.await;

	let registry = Registry::new(["auth0"]);
	let config = idp_config("auth0", &format!("{}/jwks.json", server.uri()), 10, 900);
	let refresher = Refresher::new(config, registry.clone()).expect("refresher");

	refresher.refresh_once().await;

	let state = registry.get("auth0").await.expect("state");
	let kids: Vec<_> = state.jwks.keys.iter().filter_map(|key| key.kid()).collect();

	assert_eq!(state.key_count, 10);
	assert_eq!(state.max_keys, 10);
	assert_eq!(kids.first(), Some(&"key-0"));
	assert_eq!(kids.last(), Some(&"key-9"));
}

#[tokio::test]
async fn a_failed_attempt_preserves_previously_published_keys() {
	let server = MockServer::start().await;
	let counter = Arc::new(AtomicUsize::new(0));
	let counter_handle = counter.clone();

	Mock::given(method("GET")).and(path("/jwks.json")).respond_with(
		move |_: &wiremock::Request| {
			if counter_handle.fetch_add(1, Ordering::SeqCst) == 0 {
				ResponseTemplate::new(200)
					.set_body_string(JWKS_BODY)
					.insert_header("cache-control", "max-age=600")
			} else {
				ResponseTemplate::new(503).set_body_string("upstream down")
			}
		},
	)
	.mount(&server)
	.await;

	let registry = Registry::new(["auth0"]);
	let config = idp_config("auth0", &format!("{}/jwks.json", server.uri()), 10, 900);
	let refresher = Refresher::new(config, registry.clone()).expect("refresher");

	refresher.refresh_once().await;

	let loaded = registry.get("auth0").await.expect("state");

	refresher.refresh_once().await;

	let state = registry.get("auth0").await.expect("state");

	assert_eq!(state.update_count, 2);
	assert!(!state.last_error.is_empty());
	assert_eq!(state.key_count, 2);
	assert_eq!(state.jwks, loaded.jwks, "failed refresh must not drop the cached keys");
	assert_eq!(state.last_updated, loaded.last_updated);
	assert_eq!(state.cache_until, loaded.cache_until);
}

#[tokio::test]
async fn identical_fetches_differ_only_in_attempt_bookkeeping() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path("/jwks.json"))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_string(JWKS_BODY)
				.insert_header("cache-control", "max-age=600"),
		)
		.mount(&server)
		.await;

	let registry = Registry::new(["auth0"]);
	let config = idp_config("auth0", &format!("{}/jwks.json", server.uri()), 10, 900);
	let refresher = Refresher::new(config, registry.clone()).expect("refresher");

	refresher.refresh_once().await;

	let first = registry.get("auth0").await.expect("state");

	refresher.refresh_once().await;

	let second = registry.get("auth0").await.expect("state");

	assert_eq!(second.update_count, first.update_count + 1);
	assert_eq!(second.jwks, first.jwks);
	assert_eq!(second.key_count, first.key_count);
	assert_eq!(second.cache_duration, first.cache_duration);
	assert_eq!(second.idp_suggested_cache, first.idp_suggested_cache);
	assert!(second.last_updated >= first.last_updated);
}

#[tokio::test]
async fn a_body_without_a_keys_array_is_a_fetch_error() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path("/jwks.json"))
		.respond_with(
			ResponseTemplate::new(200).set_body_string(r#"{"kid": "not-a-keyset"}"#),
		)
		.mount(&server)
		.await;

	let registry = Registry::new(["auth0"]);
	let config = idp_config("auth0", &format!("{}/jwks.json", server.uri()), 10, 900);
	let refresher = Refresher::new(config, registry.clone()).expect("refresher");

	refresher.refresh_once().await;

	let state = registry.get("auth0").await.expect("state");

	assert!(!state.is_loaded());
	assert_eq!(state.update_count, 1);
	assert!(!state.last_error.is_empty());
	assert!(state.jwks.is_empty());
}

#[tokio::test]
async fn the_shutdown_signal_stops_the_refresh_loop() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path("/jwks.json"))
		.respond_with(ResponseTemplate::new(200).set_body_string(JWKS_BODY))
		.mount(&server)
		.await;

	let registry = Registry::new(["auth0"]);
	let config = idp_config("auth0", &format!("{}/jwks.json", server.uri()), 10, 900);
	let refresher = Refresher::new(config, registry.clone()).expect("refresher");
	let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
	let handle = tokio::spawn(refresher.run(shutdown_rx));

	// Give the startup fetch a moment to land before cancelling.
	time::sleep(Duration::from_millis(200)).await;

	shutdown_tx.send(()).expect("signal");

	time::timeout(Duration::from_secs(2), handle)
		.await
		.expect("refresher should exit promptly after cancellation")
		.expect("refresher task");

	assert!(registry.get("auth0").await.expect("state").is_loaded());
}
