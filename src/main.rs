//! Binary entry point: configuration, logging, refresher fleet, query server, and shutdown.

// std
use std::net::SocketAddr;
// crates.io
use clap::Parser;
use tokio::{net::TcpListener, sync::broadcast, task::JoinError, time};
use tracing::{error, info, warn};
// self
use jwks_aggregator::{
	Error, Refresher, Registry, Result,
	cli::Args,
	config::Config,
	http::client::FETCH_TIMEOUT,
	logging,
	server::{self, SHUTDOWN_GRACE},
};

#[tokio::main]
async fn main() {
	if let Err(err) = run().await {
		eprintln!("{err}");
		std::process::exit(1);
	}
}

async fn run() -> Result<()> {
	let args = Args::parse();
	let config = Config::load(&args.config)?;

	logging::init(&config.logging);

	info!(version = env!("CARGO_PKG_VERSION"), "starting JWKS aggregation service");

	let registry = Registry::new(config.idps.iter().map(|idp| idp.name.clone()));
	let (shutdown_tx, _) = broadcast::channel(1);
	let mut refreshers = Vec::with_capacity(config.idps.len());

	for idp in &config.idps {
		let refresher = Refresher::new(idp.clone(), registry.clone())?;

		refreshers.push(tokio::spawn(refresher.run(shutdown_tx.subscribe())));
	}

	let host = config
		.server
		.host
		.parse()
		.map_err(|err| Error::Config(format!("Invalid server host: {err}.")))?;
	let addr = SocketAddr::new(host, config.server.port);
	let listener = TcpListener::bind(addr).await?;

	info!(%addr, idps = config.idps.len(), "listening");

	let mut server = tokio::spawn(server::serve(listener, registry, shutdown_tx.subscribe()));
	let early_exit = tokio::select! {
		_ = shutdown_signal() => {
			info!("shutdown signal received");

			None
		},
		result = &mut server => Some(result),
	};

	let _ = shutdown_tx.send(());

	match early_exit {
		Some(result) => report_server_exit(result),
		None => match time::timeout(SHUTDOWN_GRACE, server).await {
			Ok(result) => report_server_exit(result),
			Err(_) => warn!("server did not drain within the shutdown grace period"),
		},
	}

	let drain = async {
		for refresher in refreshers {
			let _ = refresher.await;
		}
	};

	if time::timeout(FETCH_TIMEOUT, drain).await.is_err() {
		warn!("refreshers did not stop within the fetch timeout");
	}

	info!("service stopped");

	Ok(())
}

fn report_server_exit(result: std::result::Result<Result<()>, JoinError>) {
	match result {
		Ok(Ok(())) => {},
		Ok(Err(err)) => error!(error = %err, "server failed"),
		Err(err) => error!(error = %err, "server task panicked"),
	}
}

async fn shutdown_signal() {
	let ctrl_c = async {
		tokio::signal::ctrl_c().await.expect("Failed to install Ctrl+C handler.");
	};

	#[cfg(unix)]
	let terminate = async {
		tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
			.expect("Failed to install SIGTERM handler.")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => {},
		() = terminate => {},
	}
}
