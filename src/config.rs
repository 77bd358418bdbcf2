//! Service configuration: server binding, IDP list, and logging.

// std
use std::{collections::HashSet, path::Path};
// crates.io
use figment::{
	Figment,
	providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;
// self
use crate::_prelude::*;

/// Default ceiling on retained keys per IDP.
pub const DEFAULT_MAX_KEYS: usize = 10;
/// Default client-facing cache duration in seconds.
pub const DEFAULT_CACHE_DURATION: u64 = 900;

/// Top-level service configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
	/// HTTP server binding.
	#[serde(default)]
	pub server: ServerConfig,
	/// Upstream IDPs to aggregate.
	#[serde(default)]
	pub idps: Vec<IdpConfig>,
	/// Logging behaviour.
	#[serde(default)]
	pub logging: LoggingConfig,
}
impl Config {
	/// Load configuration from a YAML file merged with `JWKS_AGGREGATOR_*` environment
	/// overrides, then apply defaults and validate.
	pub fn load(path: &Path) -> Result<Self> {
		if !path.exists() {
			return Err(Error::Config(format!("Config file not found: {}.", path.display())));
		}

		Self::from_figment(
			Figment::new()
				.merge(Yaml::file(path))
				.merge(Env::prefixed("JWKS_AGGREGATOR_").split("__")),
		)
	}

	fn from_figment(figment: Figment) -> Result<Self> {
		let mut config: Self = figment.extract()?;

		for idp in &mut config.idps {
			if idp.max_keys == 0 {
				idp.max_keys = DEFAULT_MAX_KEYS;
			}
			if idp.cache_duration == 0 {
				idp.cache_duration = DEFAULT_CACHE_DURATION;
			}
		}

		config.validate()?;

		Ok(config)
	}

	/// Validate the configured IDP entries.
	pub fn validate(&self) -> Result<()> {
		if self.idps.is_empty() {
			return Err(Error::Validation {
				field: "idps",
				reason: "At least one IDP must be configured.".into(),
			});
		}

		let mut seen = HashSet::with_capacity(self.idps.len());

		for idp in &self.idps {
			validate_idp_name(&idp.name)?;

			if !seen.insert(idp.name.as_str()) {
				return Err(Error::Validation {
					field: "idps.name",
					reason: format!("Duplicate IDP name '{}'.", idp.name),
				});
			}
			if idp.refresh_interval == 0 {
				return Err(Error::Validation {
					field: "idps.refresh_interval",
					reason: format!("Must be greater than zero for IDP '{}'.", idp.name),
				});
			}
		}

		Ok(())
	}
}

/// HTTP server binding configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
	/// Host address to bind to.
	pub host: String,
	/// Port to listen on.
	pub port: u16,
}
impl Default for ServerConfig {
	fn default() -> Self {
		Self { host: "127.0.0.1".into(), port: 8080 }
	}
}

/// Configuration for one upstream IDP.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdpConfig {
	/// Registry key and URL path segment; unique and URL-safe.
	pub name: String,
	/// Upstream JWKS endpoint.
	pub url: Url,
	/// Seconds between fetches.
	pub refresh_interval: u64,
	/// Ceiling on retained keys; 0 or absent means the default of 10.
	#[serde(default)]
	pub max_keys: usize,
	/// Client-facing cache seconds; 0 or absent means the default of 900.
	#[serde(default)]
	pub cache_duration: u64,
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// Minimum level: trace, debug, info, warn, or error.
	pub level: String,
	/// Output format, `text` or `json`.
	pub format: String,
}
impl Default for LoggingConfig {
	fn default() -> Self {
		Self { level: "info".into(), format: "text".into() }
	}
}

fn validate_idp_name(value: &str) -> Result<()> {
	if value.is_empty() {
		return Err(Error::Validation { field: "idps.name", reason: "Must not be empty.".into() });
	}
	if value.len() > 64 {
		return Err(Error::Validation {
			field: "idps.name",
			reason: "Must be 64 characters or fewer.".into(),
		});
	}
	if !value.as_bytes().iter().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_')) {
		return Err(Error::Validation {
			field: "idps.name",
			reason: "May only contain ASCII letters, numbers, '-', or '_'.".into(),
		});
	}

	Ok(())
}
