//! Order data model for the dispatch system.
//!
//! Orders are created externally by the checkout flow and only ever mutated
//! by the lifecycle manager through valid state transitions. This module
//! defines the order itself, its line items, the lifecycle status enum, and
//! the patch type used for partial writes to the order store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A customer order moving through its fulfilment lifecycle.
///
/// The monetary total is immutable once set and is never recomputed on a
/// transition. The tracking code is absent exactly while the order is
/// `Pending`; it becomes present the moment the carrier accepts a shipment
/// and stays present for every later status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier assigned by the external order store.
	pub id: String,
	/// Customer name used as the shipment receiver name.
	pub customer_name: String,
	/// Delivery address.
	pub address: String,
	/// Customer phone number.
	pub phone: String,
	/// Customer email address.
	pub email: String,
	/// Line items belonging exclusively to this order.
	pub items: Vec<LineItem>,
	/// Monetary total of the order; immutable once set.
	pub order_total: Decimal,
	/// Whether payment has been settled.
	pub is_paid: bool,
	/// Shipping cost charged for this order.
	pub shipping_cost: Decimal,
	/// Carrier-issued tracking code, present iff the order left `Pending`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tracking_code: Option<String>,
	/// Current lifecycle status.
	pub status: OrderStatus,
	/// Timestamp when the order was created by the checkout flow.
	pub created_at: DateTime<Utc>,
	/// Timestamp of the last lifecycle write.
	pub updated_at: DateTime<Utc>,
}

impl Order {
	/// Checks the data-model invariant linking tracking code and status.
	///
	/// A `Pending` order has no tracking code; `Shipping` and `Delivered`
	/// orders always carry one. `Cancelled` orders may have either, since
	/// cancellation can strike before or after the carrier hand-off.
	pub fn tracking_consistent(&self) -> bool {
		match self.status {
			OrderStatus::Pending => self.tracking_code.is_none(),
			OrderStatus::Cancelled => true,
			_ => self.tracking_code.is_some(),
		}
	}
}

/// A single purchased item within an order.
///
/// Line items are exclusively owned by their order and never shared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
	/// Reference to the purchased product.
	pub product_id: String,
	/// Display name shown to staff.
	pub name: String,
	/// Image reference for the product.
	pub image: String,
	/// Ordered size variant.
	pub size: String,
	/// Unit price at the time of purchase.
	pub unit_price: Decimal,
	/// Number of units ordered; always greater than zero.
	pub quantity: u32,
}

/// Lifecycle status of an order.
///
/// The valid transitions between these states are owned by the lifecycle
/// manager; nothing else may move an order between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
	/// Awaiting carrier hand-off; the only state in which deletion is allowed.
	Pending,
	/// Accepted by the carrier and in transit.
	Shipping,
	/// Delivered to the customer; terminal.
	Delivered,
	/// Cancelled by staff; terminal.
	Cancelled,
}

impl OrderStatus {
	/// Returns the canonical string label for this status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Pending => "Pending",
			OrderStatus::Shipping => "Shipping",
			OrderStatus::Delivered => "Delivered",
			OrderStatus::Cancelled => "Cancelled",
		}
	}

	/// Returns true when no further transitions are permitted.
	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Partial update applied to a stored order.
///
/// Only the set fields are written. The `expected_status` field is an
/// optimistic-concurrency precondition: when present, the write fails with a
/// conflict unless the stored order is currently in that status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderPatch {
	/// New lifecycle status, if it changes.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<OrderStatus>,
	/// Carrier tracking code, set once on the Pending to Shipping transition.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tracking_code: Option<String>,
	/// Status the caller observed when deciding to write.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expected_status: Option<OrderStatus>,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn order(status: OrderStatus, tracking_code: Option<&str>) -> Order {
		Order {
			id: "o-1".to_string(),
			customer_name: "Nguyen Van A".to_string(),
			address: "143/3 Hai Ba Trung".to_string(),
			phone: "0773450028".to_string(),
			email: "a@example.com".to_string(),
			items: vec![],
			order_total: Decimal::from(100),
			is_paid: false,
			shipping_cost: Decimal::from(5),
			tracking_code: tracking_code.map(str::to_string),
			status,
			created_at: Utc::now(),
			updated_at: Utc::now(),
		}
	}

	#[test]
	fn test_tracking_invariant() {
		assert!(order(OrderStatus::Pending, None).tracking_consistent());
		assert!(order(OrderStatus::Shipping, Some("VT1")).tracking_consistent());
		assert!(order(OrderStatus::Delivered, Some("VT1")).tracking_consistent());

		// Cancellation is consistent on either side of the hand-off
		assert!(order(OrderStatus::Cancelled, None).tracking_consistent());
		assert!(order(OrderStatus::Cancelled, Some("VT1")).tracking_consistent());

		// Violations in both directions
		assert!(!order(OrderStatus::Pending, Some("VT1")).tracking_consistent());
		assert!(!order(OrderStatus::Shipping, None).tracking_consistent());
	}

	#[test]
	fn test_status_labels() {
		assert_eq!(OrderStatus::Pending.as_str(), "Pending");
		assert_eq!(OrderStatus::Cancelled.to_string(), "Cancelled");
		assert!(OrderStatus::Delivered.is_terminal());
		assert!(OrderStatus::Cancelled.is_terminal());
		assert!(!OrderStatus::Shipping.is_terminal());
	}

	#[test]
	fn test_status_serde_round_trip() {
		let json = serde_json::to_string(&OrderStatus::Shipping).unwrap();
		assert_eq!(json, "\"Shipping\"");
		let status: OrderStatus = serde_json::from_str("\"Pending\"").unwrap();
		assert_eq!(status, OrderStatus::Pending);
	}

	#[test]
	fn test_patch_skips_unset_fields() {
		let patch = OrderPatch {
			status: Some(OrderStatus::Cancelled),
			..Default::default()
		};
		let json = serde_json::to_value(&patch).unwrap();
		assert_eq!(json, serde_json::json!({ "status": "Cancelled" }));
	}
}
