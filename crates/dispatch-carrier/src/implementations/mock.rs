//! Mock carrier implementation for testing.
//!
//! Issues sequential tracking numbers, counts login and shipment calls, and
//! can be scripted to fail the next shipment with a chosen error. Clones
//! share state so a test can keep a handle while the service owns the boxed
//! gateway.

use crate::{CarrierError, CarrierInterface, CarrierRegistry};
use async_trait::async_trait;
use dispatch_types::{
	CarrierCredentials, CarrierSession, ConfigSchema, Field, FieldType, ImplementationRegistry,
	Schema, ShipmentRequest, ValidationError,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock carrier implementation.
#[derive(Clone)]
pub struct MockCarrier {
	inner: Arc<MockState>,
}

struct MockState {
	/// Prefix for issued tracking numbers.
	prefix: String,
	/// Sequence counter for tracking numbers and session tokens.
	sequence: AtomicU64,
	/// Number of login calls observed.
	logins: AtomicU64,
	/// Number of shipment calls observed.
	creates: AtomicU64,
	/// Errors to return from upcoming shipment calls, in order.
	failures: Mutex<VecDeque<CarrierError>>,
	/// Pause inserted into each login so tests can overlap callers.
	login_delay: Mutex<Option<Duration>>,
}

impl MockCarrier {
	/// Creates a mock issuing tracking numbers with the given prefix.
	pub fn new(prefix: impl Into<String>) -> Self {
		Self {
			inner: Arc::new(MockState {
				prefix: prefix.into(),
				sequence: AtomicU64::new(0),
				logins: AtomicU64::new(0),
				creates: AtomicU64::new(0),
				failures: Mutex::new(VecDeque::new()),
				login_delay: Mutex::new(None),
			}),
		}
	}

	/// Scripts the next shipment call to fail with the given error.
	///
	/// Queued failures are consumed in order before any tracking number is
	/// issued again.
	pub fn fail_next(&self, error: CarrierError) {
		if let Ok(mut failures) = self.inner.failures.lock() {
			failures.push_back(error);
		}
	}

	/// Makes every login call sleep for the given duration before returning.
	///
	/// Lets a test hold one caller inside `authenticate` while another
	/// arrives, to exercise session sharing under contention.
	pub fn delay_logins(&self, delay: Duration) {
		if let Ok(mut login_delay) = self.inner.login_delay.lock() {
			*login_delay = Some(delay);
		}
	}

	/// Returns how many login calls the mock has observed.
	pub fn login_count(&self) -> u64 {
		self.inner.logins.load(Ordering::SeqCst)
	}

	/// Returns how many shipment calls the mock has observed.
	pub fn create_count(&self) -> u64 {
		self.inner.creates.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl CarrierInterface for MockCarrier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MockCarrierSchema)
	}

	async fn authenticate(
		&self,
		_credentials: &CarrierCredentials,
	) -> Result<CarrierSession, CarrierError> {
		let n = self.inner.logins.fetch_add(1, Ordering::SeqCst) + 1;
		let delay = self.inner.login_delay.lock().ok().and_then(|d| *d);
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		Ok(CarrierSession::new(format!("mock-token-{}", n)))
	}

	async fn create_shipment(
		&self,
		_session: &CarrierSession,
		_request: &ShipmentRequest,
	) -> Result<String, CarrierError> {
		self.inner.creates.fetch_add(1, Ordering::SeqCst);

		let scripted = self
			.inner
			.failures
			.lock()
			.ok()
			.and_then(|mut failures| failures.pop_front());
		if let Some(error) = scripted {
			return Err(error);
		}

		let n = self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1;
		Ok(format!("{}{}", self.inner.prefix, n))
	}
}

/// Configuration schema for MockCarrier.
pub struct MockCarrierSchema;

impl ConfigSchema for MockCarrierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![Field::new("prefix", FieldType::String)]).validate(config)
	}
}

/// Factory function to create a mock carrier from configuration.
pub fn create_carrier(config: &toml::Value) -> Result<Box<dyn CarrierInterface>, CarrierError> {
	MockCarrierSchema
		.validate(config)
		.map_err(|e| CarrierError::Configuration(e.to_string()))?;

	let prefix = config
		.get("prefix")
		.and_then(|v| v.as_str())
		.unwrap_or("MOCK");
	Ok(Box::new(MockCarrier::new(prefix)))
}

/// Registry for the mock carrier implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "mock";
	type Factory = crate::CarrierFactory;

	fn factory() -> Self::Factory {
		create_carrier
	}
}

impl CarrierRegistry for Registry {}
