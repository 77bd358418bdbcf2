//! Crate-wide error types and `Result` alias.

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the JWKS aggregation service.
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	Serde(#[from] serde_json::Error),
	#[error(transparent)]
	Url(#[from] url::ParseError),

	#[error("Configuration error: {0}")]
	Config(String),
	#[error("IDP '{name}' has no keys loaded yet.")]
	NotLoaded { name: String },
	#[error("IDP '{name}' is not configured.")]
	UnknownIdp { name: String },
	#[error("Upstream HTTP status {status} from {url}: {body:?}")]
	UpstreamStatus { status: http::StatusCode, url: url::Url, body: Option<String> },
	#[error("Validation failed for {field}: {reason}")]
	Validation { field: &'static str, reason: String },
}
impl From<figment::Error> for Error {
	fn from(value: figment::Error) -> Self {
		Self::Config(value.to_string())
	}
}
