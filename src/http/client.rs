//! HTTP client integration for upstream JWKS retrieval.

// crates.io
use http::{
	StatusCode,
	header::{ACCEPT, CACHE_CONTROL},
};
use reqwest::Client;
use url::Url;
// self
use crate::{_prelude::*, http::semantics, keyset::KeySet};

/// Total timeout applied to one fetch attempt.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a successful JWKS fetch.
#[derive(Clone, Debug)]
pub struct FetchedKeys {
	/// Parsed key set in upstream order, not yet truncated.
	pub keyset: KeySet,
	/// `max-age` advertised via `Cache-Control`, 0 when absent.
	pub max_age: u64,
}

/// Build the HTTP client owned by one refresher.
pub fn build_client() -> Result<Client> {
	Client::builder()
		.user_agent(format!("jwks-aggregator/{}", env!("CARGO_PKG_VERSION")))
		.timeout(FETCH_TIMEOUT)
		.build()
		.map_err(Error::from)
}

/// Execute one GET against an upstream JWKS endpoint.
///
/// Anything other than a 200 carrying a parseable `keys` array is an error; the caller records
/// it and waits for the next tick.
pub async fn fetch_keyset(client: &Client, url: &Url) -> Result<FetchedKeys> {
	let response = client.get(url.clone()).header(ACCEPT, "application/json").send().await?;
	let status = response.status();

	if status != StatusCode::OK {
		let body = response.text().await.ok();

		return Err(Error::UpstreamStatus { status, url: url.clone(), body });
	}

	let max_age = semantics::parse_max_age(
		response.headers().get(CACHE_CONTROL).and_then(|value| value.to_str().ok()),
	);
	let bytes = response.bytes().await?;
	let keyset: KeySet = serde_json::from_slice(&bytes)?;

	tracing::debug!(%url, keys = keyset.len(), max_age, "fetched upstream key set");

	Ok(FetchedKeys { keyset, max_age })
}
