//! Configuration module for the dispatch system.
//!
//! This module provides structures and utilities for managing dispatch
//! configuration. It supports loading configuration from TOML files with
//! `${VAR}` environment variable resolution and provides validation to
//! ensure all required configuration values are properly set.

use dispatch_types::SecretString;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the dispatch service.
///
/// This structure contains all configuration sections required for the
/// service to operate: service identity, the order store backend, the
/// carrier gateway with its partner credentials, the sender profile used
/// for every shipment, and the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration specific to this service instance.
	pub service: ServiceConfig,
	/// Configuration for the order store backend.
	pub store: StoreConfig,
	/// Configuration for the carrier gateway.
	pub carrier: CarrierConfig,
	/// Sender profile applied to every shipment.
	pub sender: SenderProfile,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Configuration specific to this service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Unique identifier for this service instance.
	pub id: String,
}

/// Configuration for the order store backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of store implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the carrier gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CarrierConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Partner account username.
	pub username: String,
	/// Partner account password; redacted when serialized.
	pub password: SecretString,
	/// Map of carrier implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Sender profile stamped onto every shipment request.
///
/// The receiver side of a shipment comes from the order; everything else
/// comes from here. Only the shop identity fields are required, the parcel
/// descriptor defaults to the values the shop ships with.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SenderProfile {
	/// Shop name printed on the waybill.
	pub name: String,
	/// Shop pickup address.
	pub address: String,
	/// Shop contact phone.
	pub phone: String,
	/// Product descriptor shown to the carrier.
	#[serde(default = "default_product_name")]
	pub product_name: String,
	/// Number of parcels per shipment.
	#[serde(default = "default_product_quantity")]
	pub product_quantity: u32,
	/// Declared parcel value.
	#[serde(default = "default_product_price")]
	pub product_price: Decimal,
	/// Parcel weight in grams.
	#[serde(default = "default_product_weight_grams")]
	pub product_weight_grams: u32,
	/// Carrier product type code.
	#[serde(default = "default_product_type")]
	pub product_type: String,
	/// Carrier payment mode code.
	#[serde(default = "default_payment_mode")]
	pub payment_mode: u8,
	/// Carrier service code selecting the delivery product.
	#[serde(default = "default_service_code")]
	pub service_code: String,
	/// Free-text note printed for the courier.
	#[serde(default)]
	pub note: String,
}

fn default_product_name() -> String {
	"Parcel".to_string()
}

fn default_product_quantity() -> u32 {
	1
}

fn default_product_price() -> Decimal {
	Decimal::from(1_000_000)
}

fn default_product_weight_grams() -> u32 {
	250
}

fn default_product_type() -> String {
	"HH".to_string()
}

fn default_payment_mode() -> u8 {
	// Receiver pays the collect amount, shop pays the shipping fee.
	3
}

fn default_service_code() -> String {
	"VSL7".to_string()
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	// Limit input size to prevent ReDoS attacks
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let full_match = match cap.get(0) {
			Some(m) => m,
			None => continue,
		};
		let var_name = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => {
				if let Some(default) = default_value {
					default.to_string()
				} else {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)));
				}
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file with environment variable resolution.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let contents = tokio::fs::read_to_string(path).await?;
		contents.parse()
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// This method performs validation across all configuration sections:
	/// - Ensures the service ID is not empty
	/// - Validates the primary store backend is configured
	/// - Validates the primary carrier and its partner credentials
	/// - Checks the sender profile names a shop, address, and phone
	fn validate(&self) -> Result<(), ConfigError> {
		// Validate service config
		if self.service.id.is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		// Validate store config
		if self.store.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Store primary implementation cannot be empty".into(),
			));
		}
		if !self.store.implementations.contains_key(&self.store.primary) {
			return Err(ConfigError::Validation(format!(
				"Primary store '{}' not found in implementations",
				self.store.primary
			)));
		}

		// Validate carrier config
		if self.carrier.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Carrier primary implementation cannot be empty".into(),
			));
		}
		if !self
			.carrier
			.implementations
			.contains_key(&self.carrier.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary carrier '{}' not found in implementations",
				self.carrier.primary
			)));
		}
		if self.carrier.username.is_empty() {
			return Err(ConfigError::Validation(
				"Carrier username cannot be empty".into(),
			));
		}
		if self.carrier.password.is_empty() {
			return Err(ConfigError::Validation(
				"Carrier password cannot be empty".into(),
			));
		}

		// Validate sender profile
		if self.sender.name.is_empty() {
			return Err(ConfigError::Validation(
				"Sender name cannot be empty".into(),
			));
		}
		if self.sender.address.is_empty() {
			return Err(ConfigError::Validation(
				"Sender address cannot be empty".into(),
			));
		}
		if self.sender.phone.is_empty() {
			return Err(ConfigError::Validation(
				"Sender phone cannot be empty".into(),
			));
		}

		Ok(())
	}
}

/// Implementation of FromStr trait for Config to enable parsing from string.
///
/// Resolves environment variables, parses the TOML, and validates the
/// resulting configuration.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
