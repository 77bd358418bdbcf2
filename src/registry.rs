//! Shared registry of per-IDP key sets and refresh metadata.
//!
//! The registry is the only shared mutable state in the service: refreshers publish into it and
//! query handlers read decoupled snapshots out of it. A published key set is immutable and only
//! ever replaced wholesale, so a snapshot never observes a half-written state.

// std
use std::collections::HashMap;
// crates.io
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
// self
use crate::{_prelude::*, keyset::KeySet};

/// Latest published key set and refresh metadata for one IDP.
///
/// Field names are part of the status API contract and serialize verbatim.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdpState {
	/// IDP identity, equal to its registry key.
	pub name: String,
	/// Last successfully parsed and truncated key set; empty until the first success.
	pub jwks: Arc<KeySet>,
	/// Wall-clock time of the last successful publish.
	pub last_updated: Option<DateTime<Utc>>,
	/// Description of the most recent failure; empty after a success.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub last_error: String,
	/// Monotonic count of attempts, successes and failures alike.
	pub update_count: u64,
	/// Number of retained keys after truncation.
	pub key_count: usize,
	/// Key ceiling in effect at the last attempt.
	pub max_keys: usize,
	/// Client-facing cache seconds chosen at the last success, the minimum of the upstream
	/// suggestion and the configured value.
	pub cache_duration: u64,
	/// `max-age` suggested by the upstream at the last success, 0 when absent.
	pub idp_suggested_cache: u64,
	/// Effective fetch period in seconds.
	pub refresh_interval: u64,
	/// Deadline until which clients may cache, `last_updated + cache_duration`.
	pub cache_until: Option<DateTime<Utc>>,
}
impl IdpState {
	fn new(name: &str) -> Self {
		Self {
			name: name.into(),
			jwks: Arc::new(KeySet::default()),
			last_updated: None,
			last_error: String::new(),
			update_count: 0,
			key_count: 0,
			max_keys: 0,
			cache_duration: 0,
			idp_suggested_cache: 0,
			refresh_interval: 0,
			cache_until: None,
		}
	}

	/// Whether at least one attempt has succeeded.
	pub fn is_loaded(&self) -> bool {
		self.last_updated.is_some()
	}
}

/// Result of one refresh attempt, carried into [`Registry::publish`].
#[derive(Clone, Debug)]
pub struct IdpUpdate {
	/// IDP the attempt ran for.
	pub name: String,
	/// Key ceiling in effect for the attempt.
	pub max_keys: usize,
	/// Fetch period in effect for the attempt.
	pub refresh_interval: u64,
	/// Success or failure payload.
	pub outcome: UpdateOutcome,
}

/// Success or failure payload of a refresh attempt.
#[derive(Clone, Debug)]
pub enum UpdateOutcome {
	/// The upstream returned a parseable key set.
	Keys {
		/// Parsed and already truncated key set.
		jwks: Arc<KeySet>,
		/// Effective client-facing cache seconds for the fetched set.
		cache_duration: u64,
		/// `max-age` advertised by the upstream, 0 when absent.
		idp_suggested_cache: u64,
	},
	/// The attempt failed; previously published key data stays in place.
	Error(String),
}

/// Thread-safe store of the latest [`IdpState`] per IDP.
#[derive(Clone, Debug)]
pub struct Registry {
	names: Arc<[String]>,
	inner: Arc<RwLock<HashMap<String, IdpState>>>,
}
impl Registry {
	/// Create a registry for the configured IDP names.
	///
	/// State slots are created lazily by the first publish; the name list fixes the merged-view
	/// iteration order and the configured IDP count.
	pub fn new<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			names: names.into_iter().map(Into::into).collect(),
			inner: Arc::new(RwLock::new(HashMap::new())),
		}
	}

	/// Configured IDP names in configuration order.
	pub fn names(&self) -> &[String] {
		&self.names
	}

	/// Number of configured IDPs, loaded or not.
	pub fn idp_count(&self) -> usize {
		self.names.len()
	}

	/// Atomically install the result of a refresh attempt.
	///
	/// Creates the state slot on the first call for an IDP. A failure update bumps the attempt
	/// count and the error text and leaves key data and cache metadata untouched. Emits the one
	/// structured record every attempt must produce.
	pub async fn publish(&self, update: IdpUpdate) {
		let IdpUpdate { name, max_keys, refresh_interval, outcome } = update;
		let mut slots = self.inner.write().await;
		let state = slots.entry(name.clone()).or_insert_with(|| IdpState::new(&name));

		state.update_count += 1;
		state.max_keys = max_keys;
		state.refresh_interval = refresh_interval;

		match outcome {
			UpdateOutcome::Keys { jwks, cache_duration, idp_suggested_cache } => {
				let now = Utc::now();

				state.key_count = jwks.len();
				state.jwks = jwks;
				state.last_error.clear();
				state.cache_duration = cache_duration;
				state.idp_suggested_cache = idp_suggested_cache;
				state.last_updated = Some(now);
				state.cache_until = i64::try_from(cache_duration)
					.ok()
					.and_then(TimeDelta::try_seconds)
					.and_then(|ttl| now.checked_add_signed(ttl));

				tracing::info!(
					idp = %state.name,
					outcome = "success",
					update_count = state.update_count,
					key_count = state.key_count,
					cache_duration = state.cache_duration,
					idp_suggested_cache = state.idp_suggested_cache,
					"refreshed key set"
				);
			},
			UpdateOutcome::Error(message) => {
				state.last_error = message;

				tracing::warn!(
					idp = %state.name,
					outcome = "error",
					update_count = state.update_count,
					error = %state.last_error,
					"refresh attempt failed"
				);
			},
		}
	}

	/// Snapshot the state of a single IDP.
	///
	/// The returned copy is decoupled from the stored slot; later publishes do not affect it.
	pub async fn get(&self, name: &str) -> Option<IdpState> {
		self.inner.read().await.get(name).cloned()
	}

	/// Snapshot the state of every IDP that has published at least once.
	pub async fn get_all(&self) -> HashMap<String, IdpState> {
		self.inner.read().await.clone()
	}
}
