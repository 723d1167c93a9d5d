//! Carrier gateway module for the dispatch system.
//!
//! This module handles shipment creation with the external shipping carrier.
//! It provides an abstraction over carrier partner APIs, managing the login
//! session lifecycle and the single re-authentication retry that hides token
//! expiry from callers.

use async_trait::async_trait;
use dispatch_types::{CarrierCredentials, CarrierSession, ConfigSchema, ShipmentRequest};
use thiserror::Error;
use tokio::sync::Mutex;

/// Re-export implementations
pub mod implementations {
	pub mod mock;
	pub mod viettel;
}

/// Errors that can occur during carrier operations.
#[derive(Debug, Error)]
pub enum CarrierError {
	/// Error that occurs during network communication; never retried.
	#[error("Network error: {0}")]
	Network(String),
	/// Error that occurs when the carrier rejects credentials or a session
	/// token. Retried once per shipment attempt with a fresh login.
	#[error("Authentication rejected: {0}")]
	Auth(String),
	/// Error that occurs when the carrier accepts a shipment but returns no
	/// tracking number. The shipment may or may not exist on the carrier side.
	#[error("Carrier response contained no tracking number")]
	MissingOrderNumber,
	/// Error that occurs when a shipment request fails local validation.
	#[error("Invalid shipment request: {0}")]
	Validation(String),
	/// Error that occurs during configuration or construction.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface to a carrier partner API.
///
/// Implementations are stateless transports: they turn a login call or a
/// shipment call into a single API request. Session caching and the
/// re-authentication retry live in [`CarrierService`], never here.
#[async_trait]
pub trait CarrierInterface: Send + Sync {
	/// Returns the configuration schema for this carrier implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Logs in with the partner credentials and returns a fresh session.
	async fn authenticate(
		&self,
		credentials: &CarrierCredentials,
	) -> Result<CarrierSession, CarrierError>;

	/// Submits a shipment under the given session and returns the
	/// carrier-issued tracking number.
	async fn create_shipment(
		&self,
		session: &CarrierSession,
		request: &ShipmentRequest,
	) -> Result<String, CarrierError>;
}

/// Type alias for carrier factory functions.
pub type CarrierFactory = fn(&toml::Value) -> Result<Box<dyn CarrierInterface>, CarrierError>;

/// Registry trait for carrier implementations.
pub trait CarrierRegistry: dispatch_types::ImplementationRegistry<Factory = CarrierFactory> {}

/// Get all registered carrier implementations.
pub fn get_all_implementations() -> Vec<(&'static str, CarrierFactory)> {
	use dispatch_types::ImplementationRegistry;
	use implementations::{mock, viettel};

	vec![
		(viettel::Registry::NAME, viettel::Registry::factory()),
		(mock::Registry::NAME, mock::Registry::factory()),
	]
}

/// Service that manages shipment creation through a carrier gateway.
///
/// The CarrierService owns the session: it logs in lazily on first use,
/// shares the cached session between concurrent shipments, and replaces it
/// when the carrier rejects its token. Callers never see sessions or tokens,
/// only tracking numbers and errors.
pub struct CarrierService {
	/// The underlying carrier transport.
	gateway: Box<dyn CarrierInterface>,
	/// Partner credentials used for every login.
	credentials: CarrierCredentials,
	/// Cached session, if one has been obtained and not invalidated.
	session: Mutex<Option<CarrierSession>>,
}

impl CarrierService {
	/// Creates a new CarrierService over the given gateway.
	pub fn new(gateway: Box<dyn CarrierInterface>, credentials: CarrierCredentials) -> Self {
		Self {
			gateway,
			credentials,
			session: Mutex::new(None),
		}
	}

	/// Creates a shipment and returns the carrier tracking number.
	///
	/// The request is validated before any network call. If the carrier
	/// rejects the cached session token, the session is discarded and the
	/// shipment is retried exactly once with a fresh login. Network failures
	/// and missing tracking numbers are never retried.
	pub async fn create_shipment(&self, request: &ShipmentRequest) -> Result<String, CarrierError> {
		request.validate().map_err(CarrierError::Validation)?;

		let session = self.ensure_session().await?;
		match self.gateway.create_shipment(&session, request).await {
			Err(CarrierError::Auth(reason)) => {
				tracing::debug!(%reason, "session rejected, re-authenticating once");
				self.invalidate(&session).await;
				let fresh = self.ensure_session().await?;
				self.gateway.create_shipment(&fresh, request).await
			}
			result => result,
		}
	}

	/// Returns the cached session, logging in if none is held.
	///
	/// The lock is held across the login call so concurrent shipments that
	/// both find the cache empty share a single login attempt.
	async fn ensure_session(&self) -> Result<CarrierSession, CarrierError> {
		let mut guard = self.session.lock().await;
		if let Some(session) = guard.as_ref() {
			return Ok(session.clone());
		}
		let session = self.gateway.authenticate(&self.credentials).await?;
		tracing::info!("carrier session established");
		*guard = Some(session.clone());
		Ok(session)
	}

	/// Discards the cached session if it is still the rejected one.
	///
	/// A concurrent caller may already have replaced the session with a
	/// fresh login; in that case the replacement is kept.
	async fn invalidate(&self, rejected: &CarrierSession) {
		let mut guard = self.session.lock().await;
		if let Some(current) = guard.as_ref() {
			if current.token == rejected.token {
				*guard = None;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::mock::MockCarrier;
	use rust_decimal::Decimal;

	fn credentials() -> CarrierCredentials {
		CarrierCredentials {
			username: "partner".to_string(),
			password: "hunter2".into(),
		}
	}

	fn request() -> ShipmentRequest {
		ShipmentRequest {
			sender_name: "DH Sneaker".to_string(),
			sender_address: "143/3 Hai Ba Trung".to_string(),
			sender_phone: "0773450028".to_string(),
			receiver_name: "Nguyen Van A".to_string(),
			receiver_address: "12 Le Loi".to_string(),
			receiver_phone: "0909000111".to_string(),
			product_name: "Sneakers".to_string(),
			product_quantity: 1,
			product_price: Decimal::from(1_000_000),
			product_weight_grams: 250,
			product_type: "HH".to_string(),
			payment_mode: 3,
			service_code: "VSL7".to_string(),
			note: "Allow inspection".to_string(),
			collect_amount: Decimal::from(1_000_000),
		}
	}

	#[tokio::test]
	async fn test_session_reused_across_shipments() {
		let mock = MockCarrier::new("VT");
		let service = CarrierService::new(Box::new(mock.clone()), credentials());

		let first = service.create_shipment(&request()).await.unwrap();
		let second = service.create_shipment(&request()).await.unwrap();

		assert_eq!(first, "VT1");
		assert_eq!(second, "VT2");
		assert_eq!(mock.login_count(), 1);
		assert_eq!(mock.create_count(), 2);
	}

	#[tokio::test]
	async fn test_concurrent_shipments_share_one_login() {
		let mock = MockCarrier::new("VT");
		// Hold the first caller inside the login so the second arrives while
		// no session exists yet.
		mock.delay_logins(std::time::Duration::from_millis(50));
		let service =
			std::sync::Arc::new(CarrierService::new(Box::new(mock.clone()), credentials()));

		let first = tokio::spawn({
			let service = service.clone();
			async move { service.create_shipment(&request()).await }
		});
		let second = tokio::spawn({
			let service = service.clone();
			async move { service.create_shipment(&request()).await }
		});

		let mut trackings = vec![
			first.await.unwrap().unwrap(),
			second.await.unwrap().unwrap(),
		];
		trackings.sort();

		assert_eq!(trackings, vec!["VT1", "VT2"]);
		assert_eq!(mock.login_count(), 1);
		assert_eq!(mock.create_count(), 2);
	}

	#[tokio::test]
	async fn test_auth_rejection_retried_exactly_once() {
		let mock = MockCarrier::new("VT");
		mock.fail_next(CarrierError::Auth("token expired".to_string()));
		let service = CarrierService::new(Box::new(mock.clone()), credentials());

		let tracking = service.create_shipment(&request()).await.unwrap();

		assert_eq!(tracking, "VT1");
		assert_eq!(mock.login_count(), 2);
		assert_eq!(mock.create_count(), 2);
	}

	#[tokio::test]
	async fn test_second_auth_rejection_surfaces() {
		let mock = MockCarrier::new("VT");
		mock.fail_next(CarrierError::Auth("token expired".to_string()));
		mock.fail_next(CarrierError::Auth("account locked".to_string()));
		let service = CarrierService::new(Box::new(mock.clone()), credentials());

		let result = service.create_shipment(&request()).await;

		assert!(matches!(result, Err(CarrierError::Auth(_))));
		assert_eq!(mock.login_count(), 2);
		assert_eq!(mock.create_count(), 2);
	}

	#[tokio::test]
	async fn test_network_failure_not_retried() {
		let mock = MockCarrier::new("VT");
		mock.fail_next(CarrierError::Network("timeout".to_string()));
		let service = CarrierService::new(Box::new(mock.clone()), credentials());

		let result = service.create_shipment(&request()).await;

		assert!(matches!(result, Err(CarrierError::Network(_))));
		assert_eq!(mock.create_count(), 1);
	}

	#[tokio::test]
	async fn test_missing_order_number_not_retried() {
		let mock = MockCarrier::new("VT");
		mock.fail_next(CarrierError::MissingOrderNumber);
		let service = CarrierService::new(Box::new(mock.clone()), credentials());

		let result = service.create_shipment(&request()).await;

		assert!(matches!(result, Err(CarrierError::MissingOrderNumber)));
		assert_eq!(mock.create_count(), 1);
	}

	#[tokio::test]
	async fn test_invalid_request_never_reaches_carrier() {
		let mock = MockCarrier::new("VT");
		let service = CarrierService::new(Box::new(mock.clone()), credentials());

		let mut bad = request();
		bad.receiver_phone = String::new();
		let result = service.create_shipment(&bad).await;

		assert!(matches!(result, Err(CarrierError::Validation(_))));
		assert_eq!(mock.login_count(), 0);
		assert_eq!(mock.create_count(), 0);
	}

	#[test]
	fn test_all_implementations_registered() {
		let names: Vec<&str> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert!(names.contains(&"viettel"));
		assert!(names.contains(&"mock"));
	}
}
