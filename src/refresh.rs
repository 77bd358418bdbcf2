//! Per-IDP refresh worker.

// crates.io
use reqwest::Client;
use tokio::{
	sync::broadcast,
	time::{self, MissedTickBehavior},
};
// self
use crate::{
	_prelude::*,
	config::IdpConfig,
	http::{client, semantics},
	registry::{IdpUpdate, Registry, UpdateOutcome},
};

/// Periodic fetch worker for a single IDP.
///
/// Each refresher owns its HTTP client and timer and shares nothing with the other refreshers;
/// the registry is the only place their results meet.
#[derive(Debug)]
pub struct Refresher {
	config: IdpConfig,
	registry: Registry,
	client: Client,
}
impl Refresher {
	/// Build a refresher for one configured IDP.
	pub fn new(config: IdpConfig, registry: Registry) -> Result<Self> {
		let client = client::build_client()?;

		Ok(Self { config, registry, client })
	}

	/// Run the fetch loop until the shutdown signal arrives.
	///
	/// The first tick fires immediately, covering the startup fetch. A cancellation that lands
	/// mid-attempt drops the attempt without publishing.
	pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
		tracing::info!(
			idp = %self.config.name,
			url = %self.config.url,
			interval = self.config.refresh_interval,
			"starting refresher"
		);

		let mut ticker = time::interval(Duration::from_secs(self.config.refresh_interval));

		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				_ = ticker.tick() => {
					tokio::select! {
						_ = self.refresh_once() => {},
						_ = shutdown.recv() => break,
					}
				},
				_ = shutdown.recv() => break,
			}
		}

		tracing::info!(idp = %self.config.name, "stopping refresher");
	}

	/// Perform one fetch attempt and publish its outcome.
	pub async fn refresh_once(&self) {
		let outcome = match self.fetch().await {
			Ok(outcome) => outcome,
			Err(err) => UpdateOutcome::Error(err.to_string()),
		};

		self.registry
			.publish(IdpUpdate {
				name: self.config.name.clone(),
				max_keys: self.config.max_keys,
				refresh_interval: self.config.refresh_interval,
				outcome,
			})
			.await;
	}

	async fn fetch(&self) -> Result<UpdateOutcome> {
		let fetched = client::fetch_keyset(&self.client, &self.config.url).await?;
		let mut keyset = fetched.keyset;
		let missing_kty = keyset.keys.iter().filter(|key| !key.has_kty()).count();

		if missing_kty > 0 {
			tracing::warn!(
				idp = %self.config.name,
				missing_kty,
				"retaining keys without a kty member"
			);
		}
		if keyset.len() > self.config.max_keys {
			tracing::warn!(
				idp = %self.config.name,
				original_count = keyset.len(),
				max_keys = self.config.max_keys,
				"upstream returned more keys than the ceiling, truncating"
			);

			keyset.keys.truncate(self.config.max_keys);
		}

		let cache_duration =
			semantics::effective_cache_duration(fetched.max_age, self.config.cache_duration);

		Ok(UpdateOutcome::Keys {
			jwks: Arc::new(keyset),
			cache_duration,
			idp_suggested_cache: fetched.max_age,
		})
	}
}
