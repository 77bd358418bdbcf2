//! HTTP query surface over the registry.
//!
//! GET-only endpoints; other methods receive a 405 from the router. Handlers never expose
//! internal error text, only the status codes fixed by the API contract.

// std
use std::{collections::HashMap, time::Instant};
// crates.io
use axum::{
	Json, Router,
	extract::{Path, Request, State},
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::get,
};
use chrono::SecondsFormat;
use http::{StatusCode, header::CACHE_CONTROL};
use serde_json::json;
use tokio::{net::TcpListener, sync::broadcast};
// self
use crate::{_prelude::*, keyset::KeySet, registry::Registry, view};

/// Grace period for in-flight requests during shutdown.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Build the query router over a registry.
pub fn router(registry: Registry) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/.well-known/jwks.json", get(merged_keys))
		.route("/jwks", get(all_keys))
		.route("/jwks/", get(missing_name))
		.route("/jwks/:name", get(idp_keys))
		.route("/status", get(all_statuses))
		.route("/status/", get(missing_name))
		.route("/status/:name", get(idp_status))
		.layer(middleware::from_fn(log_requests))
		.with_state(registry)
}

/// Serve the router until the shutdown signal arrives, then drain in-flight requests.
pub async fn serve(
	listener: TcpListener,
	registry: Registry,
	mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
	axum::serve(listener, router(registry))
		.with_graceful_shutdown(async move {
			let _ = shutdown.recv().await;
		})
		.await
		.map_err(Error::from)
}

async fn health() -> impl IntoResponse {
	Json(json!({
		"status": "healthy",
		"time": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
	}))
}

async fn merged_keys(State(registry): State<Registry>) -> impl IntoResponse {
	let view = view::merged_view(&registry).await;

	(
		[
			(CACHE_CONTROL.as_str(), format!("public, max-age={}", view.cache_duration)),
			("x-total-keys", view.total_keys.to_string()),
			("x-idp-count", view.idp_count.to_string()),
		],
		Json(view.jwks),
	)
}

async fn all_keys(State(registry): State<Registry>) -> impl IntoResponse {
	let keysets: HashMap<String, Arc<KeySet>> = registry
		.get_all()
		.await
		.into_iter()
		.filter(|(_, state)| !state.jwks.is_empty())
		.map(|(name, state)| (name, state.jwks))
		.collect();

	Json(keysets)
}

async fn idp_keys(State(registry): State<Registry>, Path(name): Path<String>) -> Response {
	if name.is_empty() {
		return missing_name().await.into_response();
	}

	match view::idp_view(&registry, &name).await {
		Ok(view) => (
			[
				(CACHE_CONTROL.as_str(), format!("public, max-age={}", view.cache_duration)),
				("x-key-count", view.key_count.to_string()),
				("x-max-keys", view.max_keys.to_string()),
				(
					"x-last-updated",
					view.last_updated.to_rfc3339_opts(SecondsFormat::Secs, true),
				),
			],
			Json(view.jwks),
		)
			.into_response(),
		Err(Error::UnknownIdp { .. } | Error::NotLoaded { .. }) =>
			(StatusCode::NOT_FOUND, "IDP not found or not loaded").into_response(),
		Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
	}
}

async fn all_statuses(State(registry): State<Registry>) -> impl IntoResponse {
	Json(registry.get_all().await)
}

async fn idp_status(State(registry): State<Registry>, Path(name): Path<String>) -> Response {
	if name.is_empty() {
		return missing_name().await.into_response();
	}

	match registry.get(&name).await {
		Some(state) => Json(state).into_response(),
		None => (StatusCode::NOT_FOUND, "IDP not found").into_response(),
	}
}

async fn missing_name() -> impl IntoResponse {
	(StatusCode::BAD_REQUEST, "IDP name required")
}

async fn log_requests(request: Request, next: Next) -> Response {
	let method = request.method().clone();
	let path = request.uri().path().to_owned();
	let start = Instant::now();
	let response = next.run(request).await;

	tracing::info!(
		%method,
		path,
		status = response.status().as_u16(),
		duration_ms = start.elapsed().as_millis() as u64,
		"http request"
	);

	response
}
