//! Logging initialization driven by the configuration file.

// crates.io
use tracing_subscriber::EnvFilter;
// self
use crate::config::LoggingConfig;

/// Initialize the global tracing subscriber from the logging section.
///
/// A set `RUST_LOG` takes precedence over the configured level. Repeated calls leave the first
/// subscriber installed.
pub fn init(config: &LoggingConfig) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(normalize_level(&config.level)));
	let builder = tracing_subscriber::fmt().with_env_filter(filter);

	if config.format.eq_ignore_ascii_case("json") {
		let _ = builder.json().try_init();
	} else {
		let _ = builder.try_init();
	}
}

fn normalize_level(level: &str) -> &'static str {
	match level.to_ascii_lowercase().as_str() {
		"trace" => "trace",
		"debug" => "debug",
		"warn" => "warn",
		"error" => "error",
		_ => "info",
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn unknown_levels_fall_back_to_info() {
		assert_eq!(normalize_level("verbose"), "info");
		assert_eq!(normalize_level("WARN"), "warn");
		assert_eq!(normalize_level("Debug"), "debug");
	}
}
