//! In-memory order store backend.
//!
//! Keeps the order collection in a vector behind a read-write lock,
//! preserving insertion order for list calls. Fully enforces the
//! expected-status precondition, which makes it the reference backend for
//! lifecycle tests and local development.

use crate::{OrderStoreInterface, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use dispatch_types::{ConfigSchema, ImplementationRegistry, Order, OrderPatch, OrderStatus};
use dispatch_types::{Schema, ValidationError};
use tokio::sync::RwLock;

/// In-memory order store implementation.
pub struct MemoryOrderStore {
	/// Orders in insertion order, protected by a read-write lock.
	orders: RwLock<Vec<Order>>,
}

impl MemoryOrderStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self {
			orders: RwLock::new(Vec::new()),
		}
	}

	/// Creates a store seeded with the given orders.
	pub fn with_orders(orders: Vec<Order>) -> Self {
		Self {
			orders: RwLock::new(orders),
		}
	}

	/// Inserts an order, mirroring the external checkout flow.
	pub async fn insert(&self, order: Order) {
		self.orders.write().await.push(order);
	}
}

impl Default for MemoryOrderStore {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl OrderStoreInterface for MemoryOrderStore {
	async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError> {
		let orders = self.orders.read().await;
		Ok(orders
			.iter()
			.filter(|o| status.is_none_or(|s| o.status == s))
			.cloned()
			.collect())
	}

	async fn get(&self, id: &str) -> Result<Order, StoreError> {
		let orders = self.orders.read().await;
		orders
			.iter()
			.find(|o| o.id == id)
			.cloned()
			.ok_or(StoreError::NotFound)
	}

	async fn patch(&self, id: &str, patch: &OrderPatch) -> Result<Order, StoreError> {
		let mut orders = self.orders.write().await;
		let order = orders
			.iter_mut()
			.find(|o| o.id == id)
			.ok_or(StoreError::NotFound)?;

		// Compare-and-swap: nothing is written on a stale expectation.
		if let Some(expected) = patch.expected_status {
			if order.status != expected {
				return Err(StoreError::Conflict(format!(
					"expected status {}, found {}",
					expected, order.status
				)));
			}
		}

		if let Some(status) = patch.status {
			order.status = status;
		}
		if let Some(ref code) = patch.tracking_code {
			order.tracking_code = Some(code.clone());
		}
		order.updated_at = Utc::now();

		Ok(order.clone())
	}

	async fn delete(&self, id: &str) -> Result<(), StoreError> {
		let mut orders = self.orders.write().await;
		let before = orders.len();
		orders.retain(|o| o.id != id);
		if orders.len() == before {
			return Err(StoreError::NotFound);
		}
		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStoreSchema)
	}
}

/// Configuration schema for MemoryOrderStore.
pub struct MemoryStoreSchema;

impl ConfigSchema for MemoryStoreSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// The memory store takes no configuration.
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Factory function to create a memory store backend from configuration.
pub fn create_store(_config: &toml::Value) -> Result<Box<dyn OrderStoreInterface>, StoreError> {
	Ok(Box::new(MemoryOrderStore::new()))
}

/// Registry for the memory store implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = crate::StoreFactory;

	fn factory() -> Self::Factory {
		create_store
	}
}

impl crate::StoreRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal::Decimal;

	fn order(id: &str, status: OrderStatus, tracking_code: Option<&str>) -> Order {
		Order {
			id: id.to_string(),
			customer_name: "Le Van C".to_string(),
			address: "1 Tran Phu".to_string(),
			phone: "0903334444".to_string(),
			email: "c@example.com".to_string(),
			items: vec![],
			order_total: Decimal::from(150),
			is_paid: true,
			shipping_cost: Decimal::from(8),
			tracking_code: tracking_code.map(str::to_string),
			status,
			created_at: Utc::now(),
			updated_at: Utc::now(),
		}
	}

	#[tokio::test]
	async fn test_list_preserves_insertion_order() {
		let store = MemoryOrderStore::with_orders(vec![
			order("a", OrderStatus::Pending, None),
			order("b", OrderStatus::Shipping, Some("VT1")),
			order("c", OrderStatus::Pending, None),
		]);

		let all = store.list(None).await.unwrap();
		let ids: Vec<&str> = all.iter().map(|o| o.id.as_str()).collect();
		assert_eq!(ids, vec!["a", "b", "c"]);

		let pending = store.list(Some(OrderStatus::Pending)).await.unwrap();
		let ids: Vec<&str> = pending.iter().map(|o| o.id.as_str()).collect();
		assert_eq!(ids, vec!["a", "c"]);
	}

	#[tokio::test]
	async fn test_patch_applies_fields() {
		let store = MemoryOrderStore::with_orders(vec![order("a", OrderStatus::Pending, None)]);
		let updated = store
			.patch(
				"a",
				&OrderPatch {
					status: Some(OrderStatus::Shipping),
					tracking_code: Some("VT42".to_string()),
					expected_status: Some(OrderStatus::Pending),
				},
			)
			.await
			.unwrap();
		assert_eq!(updated.status, OrderStatus::Shipping);
		assert_eq!(updated.tracking_code.as_deref(), Some("VT42"));
	}

	#[tokio::test]
	async fn test_stale_expectation_conflicts_without_write() {
		let store = MemoryOrderStore::with_orders(vec![order(
			"a",
			OrderStatus::Shipping,
			Some("VT1"),
		)]);
		let result = store
			.patch(
				"a",
				&OrderPatch {
					status: Some(OrderStatus::Shipping),
					tracking_code: Some("VT-DUP".to_string()),
					expected_status: Some(OrderStatus::Pending),
				},
			)
			.await;
		assert!(matches!(result, Err(StoreError::Conflict(_))));

		// The stored order is untouched.
		let stored = store.get("a").await.unwrap();
		assert_eq!(stored.tracking_code.as_deref(), Some("VT1"));
		assert_eq!(stored.status, OrderStatus::Shipping);
	}

	#[tokio::test]
	async fn test_get_and_delete_missing_order() {
		let store = MemoryOrderStore::new();
		assert!(matches!(store.get("nope").await, Err(StoreError::NotFound)));
		assert!(matches!(
			store.delete("nope").await,
			Err(StoreError::NotFound)
		));
	}
}
