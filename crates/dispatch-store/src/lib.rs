//! Order store module for the dispatch system.
//!
//! The authoritative order collection lives in an external store reached
//! over a request/response API; nothing is persisted locally. This module
//! defines the store boundary trait, the typed service wrapper the rest of
//! the system talks to, and the available backend implementations.

use async_trait::async_trait;
use dispatch_types::{ConfigSchema, ImplementationRegistry, Order, OrderPatch, OrderStatus};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod http;
	pub mod memory;
}

/// Errors that can occur during order store operations.
#[derive(Debug, Error)]
pub enum StoreError {
	/// Error that occurs when the requested order does not exist.
	#[error("Order not found")]
	NotFound,
	/// Error that occurs on transport failure or timeout; retryable.
	#[error("Network error: {0}")]
	Network(String),
	/// Error that occurs when the store rejects the bearer credential.
	#[error("Authentication rejected: {0}")]
	Auth(String),
	/// Error that occurs when a write's expected-status precondition fails.
	#[error("Conflict: {0}")]
	Conflict(String),
	/// Error that occurs while encoding or decoding order payloads.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs during configuration or construction.
	#[error("Configuration error: {0}")]
	Configuration(String),
	/// Error reported by the store backend itself.
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Trait defining the interface to an order store backend.
///
/// Implementations expose list/get/patch/delete over the authoritative
/// order collection. A patch must honour the `expected_status` precondition
/// when the backend is able to: if the stored order's current status differs
/// from the expectation, nothing is written and `Conflict` is returned.
#[async_trait]
pub trait OrderStoreInterface: Send + Sync {
	/// Lists orders, optionally restricted to a single status.
	///
	/// The returned ordering is the store's ordering and must be stable
	/// across calls that do not interleave with writes.
	async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError>;

	/// Fetches a single order by identifier.
	async fn get(&self, id: &str) -> Result<Order, StoreError>;

	/// Applies a partial update and returns the updated order.
	async fn patch(&self, id: &str, patch: &OrderPatch) -> Result<Order, StoreError>;

	/// Removes an order; only ever invoked for pending orders.
	async fn delete(&self, id: &str) -> Result<(), StoreError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for store factory functions.
pub type StoreFactory = fn(&toml::Value) -> Result<Box<dyn OrderStoreInterface>, StoreError>;

/// Registry trait for store implementations.
pub trait StoreRegistry: ImplementationRegistry<Factory = StoreFactory> {}

/// Get all registered store implementations.
///
/// Returns a vector of (name, factory) tuples used by the service wiring to
/// resolve the configured primary backend.
pub fn get_all_implementations() -> Vec<(&'static str, StoreFactory)> {
	use implementations::{http, memory};

	vec![
		(http::Registry::NAME, http::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Typed order store the rest of the system talks to.
///
/// Wraps a backend implementation, adds tracing, and checks the tracking
/// invariant on every write so a backend that drifts out of shape is
/// noticed immediately.
pub struct OrderStore {
	/// The underlying store backend implementation.
	backend: Box<dyn OrderStoreInterface>,
}

impl OrderStore {
	/// Creates a new OrderStore over the given backend.
	pub fn new(backend: Box<dyn OrderStoreInterface>) -> Self {
		Self { backend }
	}

	/// Lists orders, optionally restricted to one status.
	pub async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError> {
		let orders = self.backend.list(status).await?;
		tracing::debug!(count = orders.len(), ?status, "listed orders");
		Ok(orders)
	}

	/// Fetches a single order by identifier.
	pub async fn get(&self, id: &str) -> Result<Order, StoreError> {
		self.backend.get(id).await
	}

	/// Applies a partial update and returns the updated order.
	pub async fn patch(&self, id: &str, patch: &OrderPatch) -> Result<Order, StoreError> {
		let order = self.backend.patch(id, patch).await?;
		if !order.tracking_consistent() {
			tracing::warn!(
				order_id = %order.id,
				status = %order.status,
				"stored order violates the tracking-code invariant"
			);
		}
		Ok(order)
	}

	/// Removes an order.
	pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
		self.backend.delete(id).await?;
		tracing::debug!(order_id = %id, "deleted order");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::implementations::memory::MemoryOrderStore;
	use super::*;
	use chrono::Utc;
	use rust_decimal::Decimal;

	fn pending_order(id: &str) -> Order {
		Order {
			id: id.to_string(),
			customer_name: "Tran Thi B".to_string(),
			address: "5 Nguyen Hue".to_string(),
			phone: "0912345678".to_string(),
			email: "b@example.com".to_string(),
			items: vec![],
			order_total: Decimal::from(200),
			is_paid: false,
			shipping_cost: Decimal::from(10),
			tracking_code: None,
			status: OrderStatus::Pending,
			created_at: Utc::now(),
			updated_at: Utc::now(),
		}
	}

	#[tokio::test]
	async fn test_store_wrapper_round_trip() {
		let store = OrderStore::new(Box::new(MemoryOrderStore::with_orders(vec![
			pending_order("o-1"),
		])));

		let fetched = store.get("o-1").await.unwrap();
		assert_eq!(fetched.status, OrderStatus::Pending);

		let patched = store
			.patch(
				"o-1",
				&OrderPatch {
					status: Some(OrderStatus::Shipping),
					tracking_code: Some("VT9".to_string()),
					expected_status: Some(OrderStatus::Pending),
				},
			)
			.await
			.unwrap();
		assert_eq!(patched.status, OrderStatus::Shipping);
		assert!(patched.tracking_consistent());

		store.delete("o-1").await.unwrap();
		assert!(matches!(store.get("o-1").await, Err(StoreError::NotFound)));
	}

	#[test]
	fn test_all_implementations_registered() {
		let names: Vec<&str> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert!(names.contains(&"http"));
		assert!(names.contains(&"memory"));
	}
}
