//! Query-side derivations over registry snapshots.
//!
//! Nothing here mutates state: both views project whatever combination of per-IDP generations
//! the registry holds at call time.

// self
use crate::{_prelude::*, config::DEFAULT_CACHE_DURATION, keyset::KeySet, registry::Registry};

/// Per-IDP projection served by the keys endpoint.
#[derive(Clone, Debug)]
pub struct IdpView {
	/// Current key set for the IDP.
	pub jwks: Arc<KeySet>,
	/// Client-facing cache seconds.
	pub cache_duration: u64,
	/// Number of retained keys.
	pub key_count: usize,
	/// Key ceiling in effect.
	pub max_keys: usize,
	/// Time of the last successful refresh.
	pub last_updated: DateTime<Utc>,
}

/// Aggregate projection served by the well-known endpoint.
#[derive(Clone, Debug)]
pub struct MergedView {
	/// Concatenated keys of every IDP with a non-empty key set.
	pub jwks: KeySet,
	/// Sum of `key_count` across contributing IDPs.
	pub total_keys: usize,
	/// Number of configured IDPs, loaded or not.
	pub idp_count: usize,
	/// Minimum `cache_duration` across contributing IDPs, 900 when none contribute.
	pub cache_duration: u64,
}

/// Project the current state of one IDP.
///
/// Distinguishes an unknown name from a known IDP that has not loaded yet; the HTTP layer maps
/// both onto its status codes.
pub async fn idp_view(registry: &Registry, name: &str) -> Result<IdpView> {
	let state = registry.get(name).await.ok_or_else(|| Error::UnknownIdp { name: name.into() })?;
	let last_updated = state.last_updated.ok_or_else(|| Error::NotLoaded { name: name.into() })?;

	Ok(IdpView {
		jwks: state.jwks,
		cache_duration: state.cache_duration,
		key_count: state.key_count,
		max_keys: state.max_keys,
		last_updated,
	})
}

/// Merge the keys of every loaded IDP into one key set.
///
/// IDPs are visited in configuration order and each contributes its keys in upstream order. The
/// merged cache duration is the minimum across the contributors, so the fastest-rotating IDP
/// bounds how long clients may cache the merged document.
pub async fn merged_view(registry: &Registry) -> MergedView {
	let mut states = registry.get_all().await;
	let mut keys = Vec::new();
	let mut total_keys = 0;
	let mut min_cache: Option<u64> = None;

	for name in registry.names() {
		let Some(state) = states.remove(name) else { continue };

		if state.jwks.is_empty() {
			continue;
		}

		total_keys += state.key_count;
		min_cache = Some(min_cache.map_or(state.cache_duration, |min| min.min(state.cache_duration)));
		keys.extend(state.jwks.keys.iter().cloned());
	}

	MergedView {
		jwks: KeySet { keys },
		total_keys,
		idp_count: registry.idp_count(),
		cache_duration: min_cache.unwrap_or(DEFAULT_CACHE_DURATION),
	}
}
