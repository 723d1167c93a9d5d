//! Main entry point for the dispatch service.
//!
//! This binary wires the order store, carrier gateway, and lifecycle engine
//! together from configuration and serves the staff-facing HTTP API. Store
//! and carrier backends are pluggable implementations selected by name.

use clap::Parser;
use dispatch_carrier::{CarrierError, CarrierService};
use dispatch_config::Config;
use dispatch_core::LifecycleService;
use dispatch_store::{OrderStore, StoreError};
use dispatch_types::CarrierCredentials;
use std::path::PathBuf;
use std::sync::Arc;

mod server;

/// Command-line arguments for the dispatch service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the dispatch service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the lifecycle service with the configured backends
/// 5. Serves the HTTP API until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let lifecycle = Arc::new(build_lifecycle(&config)?);

	let api_config = match config.api {
		Some(api) if api.enabled => api,
		_ => {
			tracing::warn!("API server disabled in configuration, nothing to do");
			return Ok(());
		},
	};

	server::start_server(api_config, lifecycle).await?;

	tracing::info!("Stopped dispatch service");
	Ok(())
}

/// Builds the lifecycle service from configuration.
///
/// Resolves the configured primary store and carrier implementations by
/// name and hands each its own configuration block.
fn build_lifecycle(config: &Config) -> Result<LifecycleService, Box<dyn std::error::Error>> {
	let store_config = config
		.store
		.implementations
		.get(&config.store.primary)
		.ok_or_else(|| {
			StoreError::Configuration(format!(
				"No configuration for store '{}'",
				config.store.primary
			))
		})?;
	let store_factory = dispatch_store::get_all_implementations()
		.into_iter()
		.find(|(name, _)| *name == config.store.primary)
		.map(|(_, factory)| factory)
		.ok_or_else(|| {
			StoreError::Configuration(format!("Unknown store backend '{}'", config.store.primary))
		})?;
	let store = OrderStore::new(store_factory(store_config)?);
	tracing::info!(backend = %config.store.primary, "order store ready");

	let carrier_config = config
		.carrier
		.implementations
		.get(&config.carrier.primary)
		.ok_or_else(|| {
			CarrierError::Configuration(format!(
				"No configuration for carrier '{}'",
				config.carrier.primary
			))
		})?;
	let carrier_factory = dispatch_carrier::get_all_implementations()
		.into_iter()
		.find(|(name, _)| *name == config.carrier.primary)
		.map(|(_, factory)| factory)
		.ok_or_else(|| {
			CarrierError::Configuration(format!(
				"Unknown carrier gateway '{}'",
				config.carrier.primary
			))
		})?;
	let gateway = carrier_factory(carrier_config)?;
	let credentials = CarrierCredentials {
		username: config.carrier.username.clone(),
		password: config.carrier.password.clone(),
	};
	let carrier = CarrierService::new(gateway, credentials);
	tracing::info!(gateway = %config.carrier.primary, "carrier gateway ready");

	Ok(LifecycleService::new(
		Arc::new(store),
		Arc::new(carrier),
		config.sender.clone(),
	))
}
