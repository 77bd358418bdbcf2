//! Command-line interface for the aggregation service binary.

// std
use std::path::PathBuf;
// crates.io
use clap::Parser;

/// Federated JWKS aggregation service.
///
/// Periodically fetches the JSON Web Key Set of every configured IDP and serves the cached
/// per-IDP and merged results over HTTP.
#[derive(Debug, Parser)]
#[command(name = "jwks-aggregator", version, about)]
pub struct Args {
	/// Path to the service configuration file (YAML).
	#[arg(short, long, env = "CONFIG_PATH", default_value = "config.yaml")]
	pub config: PathBuf,
}
