//! Order lifecycle state machine.
//!
//! Manages order state transitions with validation, ensuring orders move
//! through valid lifecycle states: Pending -> Shipping -> Delivered, with
//! cancellation allowed from any non-terminal state. Shipment creation is
//! fused with the Pending -> Shipping transition because the carrier
//! tracking number is the proof the carrier accepted the shipment; the two
//! are never persisted separately.

use dispatch_carrier::{CarrierError, CarrierService};
use dispatch_config::SenderProfile;
use dispatch_store::{OrderStore, StoreError};
use dispatch_types::{Order, OrderPatch, OrderStatus, ShipmentRequest};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors that can occur during lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
	/// Error propagated from the order store.
	#[error("Store error: {0}")]
	Store(StoreError),
	/// Error propagated from the carrier gateway.
	#[error("Carrier error: {0}")]
	Carrier(#[from] CarrierError),
	/// Error that occurs when a status change is not in the transition table.
	#[error("Invalid state transition from {from} to {to}")]
	InvalidTransition { from: OrderStatus, to: OrderStatus },
	/// Error that occurs when the target order does not exist.
	#[error("Order not found: {0}")]
	OrderNotFound(String),
	/// Error that occurs when another transition is in flight for the order.
	#[error("Operation already in flight for order: {0}")]
	OperationInFlight(String),
	/// Error that occurs when an operation's preconditions fail locally.
	#[error("Validation error: {0}")]
	Validation(String),
}

/// Static transition table - each state maps to allowed next states.
static TRANSITIONS: Lazy<HashMap<OrderStatus, HashSet<OrderStatus>>> = Lazy::new(|| {
	let mut m = HashMap::new();
	m.insert(
		OrderStatus::Pending,
		HashSet::from([OrderStatus::Shipping, OrderStatus::Cancelled]),
	);
	m.insert(
		OrderStatus::Shipping,
		HashSet::from([OrderStatus::Delivered, OrderStatus::Cancelled]),
	);
	m.insert(OrderStatus::Delivered, HashSet::new()); // terminal
	m.insert(OrderStatus::Cancelled, HashSet::new()); // terminal
	m
});

/// Checks if a state transition is valid.
fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
	TRANSITIONS.get(&from).is_some_and(|set| set.contains(&to))
}

/// Service that owns every order status transition.
///
/// All transition actions go through here: reads come straight from the
/// store, writes carry an expected-status precondition, and the
/// Pending -> Shipping transition is only reachable through
/// [`create_shipment`](LifecycleService::create_shipment). A per-order
/// in-flight guard serializes transitions against the same order.
pub struct LifecycleService {
	/// Order store the transitions are persisted to.
	store: Arc<OrderStore>,
	/// Carrier gateway used for shipment creation.
	carrier: Arc<CarrierService>,
	/// Sender profile stamped onto every shipment request.
	sender: SenderProfile,
	/// Orders with a transition currently in flight.
	in_flight: Mutex<HashSet<String>>,
}

impl LifecycleService {
	/// Creates a new LifecycleService over the given store and carrier.
	pub fn new(store: Arc<OrderStore>, carrier: Arc<CarrierService>, sender: SenderProfile) -> Self {
		Self {
			store,
			carrier,
			sender,
			in_flight: Mutex::new(HashSet::new()),
		}
	}

	/// Lists all orders.
	pub async fn list_all(&self) -> Result<Vec<Order>, LifecycleError> {
		self.store.list(None).await.map_err(LifecycleError::Store)
	}

	/// Lists orders awaiting shipment.
	pub async fn list_pending(&self) -> Result<Vec<Order>, LifecycleError> {
		self.store
			.list(Some(OrderStatus::Pending))
			.await
			.map_err(LifecycleError::Store)
	}

	/// Fetches a single order.
	pub async fn get_order(&self, id: &str) -> Result<Order, LifecycleError> {
		self.store
			.get(id)
			.await
			.map_err(|e| Self::not_found(id, e))
	}

	/// Creates a carrier shipment for a pending order.
	///
	/// On carrier success the order moves Pending -> Shipping with the
	/// returned tracking number in the same write. Any carrier failure
	/// leaves the order untouched; a later retry is an explicit staff
	/// action, never automatic.
	pub async fn create_shipment(&self, id: &str) -> Result<Order, LifecycleError> {
		let _guard = self.begin(id)?;

		let order = self
			.store
			.get(id)
			.await
			.map_err(|e| Self::not_found(id, e))?;
		if order.status != OrderStatus::Pending {
			return Err(LifecycleError::InvalidTransition {
				from: order.status,
				to: OrderStatus::Shipping,
			});
		}

		let request = self.build_shipment_request(&order);
		let tracking_code = self.carrier.create_shipment(&request).await?;
		tracing::info!(order_id = %id, %tracking_code, "carrier accepted shipment");

		let patch = OrderPatch {
			status: Some(OrderStatus::Shipping),
			tracking_code: Some(tracking_code),
			expected_status: Some(OrderStatus::Pending),
		};
		self.store
			.patch(id, &patch)
			.await
			.map_err(|e| Self::not_found(id, e))
	}

	/// Transitions an order to a new status with validation.
	///
	/// Shipping is not reachable here: the only way into Shipping is
	/// [`create_shipment`](LifecycleService::create_shipment), which carries
	/// the tracking number the status requires.
	pub async fn update_status(
		&self,
		id: &str,
		new_status: OrderStatus,
	) -> Result<Order, LifecycleError> {
		let _guard = self.begin(id)?;

		let order = self
			.store
			.get(id)
			.await
			.map_err(|e| Self::not_found(id, e))?;
		if new_status == OrderStatus::Shipping || !is_valid_transition(order.status, new_status) {
			return Err(LifecycleError::InvalidTransition {
				from: order.status,
				to: new_status,
			});
		}

		let patch = OrderPatch {
			status: Some(new_status),
			tracking_code: None,
			expected_status: Some(order.status),
		};
		let updated = self
			.store
			.patch(id, &patch)
			.await
			.map_err(|e| Self::not_found(id, e))?;
		tracing::info!(order_id = %id, from = %order.status, to = %new_status, "order transitioned");
		Ok(updated)
	}

	/// Removes a pending order.
	pub async fn delete(&self, id: &str) -> Result<(), LifecycleError> {
		let _guard = self.begin(id)?;

		let order = self
			.store
			.get(id)
			.await
			.map_err(|e| Self::not_found(id, e))?;
		if order.status != OrderStatus::Pending {
			return Err(LifecycleError::Validation(format!(
				"only pending orders can be deleted, order is {}",
				order.status
			)));
		}

		self.store
			.delete(id)
			.await
			.map_err(|e| Self::not_found(id, e))
	}

	/// Builds the carrier request for an order from the sender profile.
	///
	/// The collect amount is the order total: the courier collects the full
	/// price on delivery.
	fn build_shipment_request(&self, order: &Order) -> ShipmentRequest {
		ShipmentRequest {
			sender_name: self.sender.name.clone(),
			sender_address: self.sender.address.clone(),
			sender_phone: self.sender.phone.clone(),
			receiver_name: order.customer_name.clone(),
			receiver_address: order.address.clone(),
			receiver_phone: order.phone.clone(),
			product_name: self.sender.product_name.clone(),
			product_quantity: self.sender.product_quantity,
			product_price: self.sender.product_price,
			product_weight_grams: self.sender.product_weight_grams,
			product_type: self.sender.product_type.clone(),
			payment_mode: self.sender.payment_mode,
			service_code: self.sender.service_code.clone(),
			note: self.sender.note.clone(),
			collect_amount: order.order_total,
		}
	}

	/// Marks an order as having a transition in flight.
	fn begin(&self, id: &str) -> Result<InFlightGuard<'_>, LifecycleError> {
		let mut in_flight = self
			.in_flight
			.lock()
			.map_err(|_| LifecycleError::Validation("in-flight guard poisoned".to_string()))?;
		if !in_flight.insert(id.to_string()) {
			return Err(LifecycleError::OperationInFlight(id.to_string()));
		}
		Ok(InFlightGuard {
			in_flight: &self.in_flight,
			id: id.to_string(),
		})
	}

	fn not_found(id: &str, err: StoreError) -> LifecycleError {
		match err {
			StoreError::NotFound => LifecycleError::OrderNotFound(id.to_string()),
			other => LifecycleError::Store(other),
		}
	}
}

/// Releases the per-order in-flight slot when the operation finishes.
struct InFlightGuard<'a> {
	in_flight: &'a Mutex<HashSet<String>>,
	id: String,
}

impl Drop for InFlightGuard<'_> {
	fn drop(&mut self) {
		if let Ok(mut in_flight) = self.in_flight.lock() {
			in_flight.remove(&self.id);
		}
	}
}
