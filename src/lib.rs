//! Federated JWKS aggregation service — per-IDP refresh workers feeding a shared registry,
//! queried through per-IDP and merged key-set views.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cli;
pub mod config;
pub mod http;
pub mod logging;
pub mod server;
pub mod view;

mod error;
mod keyset;
mod refresh;
mod registry;
mod _prelude {
	pub use std::{sync::Arc, time::Duration};

	pub use chrono::{DateTime, TimeDelta, Utc};

	pub use crate::{Error, Result};
}
pub use crate::{
	error::{Error, Result},
	keyset::{Jwk, KeySet},
	refresh::Refresher,
	registry::{IdpState, IdpUpdate, Registry, UpdateOutcome},
};
