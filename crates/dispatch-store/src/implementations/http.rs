//! HTTP order store backend.
//!
//! Talks to the external order service over its REST API using a bearer
//! token. Order payloads cross the wire in the service's own field naming,
//! which this module maps to and from the internal model. The service does
//! not check the expected-status precondition itself, so patches send the
//! expectation along and rely on the service's conflict response.

use crate::{OrderStoreInterface, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dispatch_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, LineItem, Order, OrderPatch,
	OrderStatus, Schema, SecretString, ValidationError,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// HTTP order store implementation.
pub struct HttpOrderStore {
	client: reqwest::Client,
	base_url: String,
	auth_token: SecretString,
}

impl HttpOrderStore {
	/// Creates a store client against the given base URL.
	pub fn new(
		base_url: String,
		auth_token: SecretString,
		timeout: Duration,
	) -> Result<Self, StoreError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| StoreError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
			auth_token,
		})
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	/// Maps a non-success HTTP status to a store error.
	fn map_status(status: reqwest::StatusCode, body: String) -> StoreError {
		match status.as_u16() {
			401 | 403 => StoreError::Auth(body),
			404 => StoreError::NotFound,
			409 => StoreError::Conflict(body),
			_ => StoreError::Backend(format!("HTTP {}: {}", status, body)),
		}
	}

	/// Maps a transport-level failure to a store error.
	fn map_transport(error: reqwest::Error) -> StoreError {
		if error.is_decode() {
			StoreError::Serialization(error.to_string())
		} else {
			StoreError::Network(error.to_string())
		}
	}

	async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
		let response = request
			.bearer_auth(self.auth_token.expose_secret())
			.send()
			.await
			.map_err(Self::map_transport)?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(Self::map_status(status, body));
		}
		Ok(response)
	}
}

#[async_trait]
impl OrderStoreInterface for HttpOrderStore {
	async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError> {
		let mut request = self.client.get(self.url("/orders"));
		if let Some(status) = status {
			request = request.query(&[("status", status.as_str())]);
		}

		let envelope: OrdersEnvelope = self
			.send(request)
			.await?
			.json()
			.await
			.map_err(Self::map_transport)?;

		Ok(envelope.orders.into_iter().map(Order::from).collect())
	}

	async fn get(&self, id: &str) -> Result<Order, StoreError> {
		let request = self.client.get(self.url(&format!("/orders/{}", id)));
		let envelope: OrderEnvelope = self
			.send(request)
			.await?
			.json()
			.await
			.map_err(Self::map_transport)?;

		Ok(Order::from(envelope.order))
	}

	async fn patch(&self, id: &str, patch: &OrderPatch) -> Result<Order, StoreError> {
		let body = WirePatch::from(patch);
		let request = self
			.client
			.patch(self.url(&format!("/orders/{}", id)))
			.json(&body);
		self.send(request).await?;

		// The patch endpoint returns no body; re-fetch the updated order.
		self.get(id).await
	}

	async fn delete(&self, id: &str) -> Result<(), StoreError> {
		let request = self.client.delete(self.url(&format!("/orders/{}", id)));
		self.send(request).await?;
		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpStoreSchema)
	}
}

/// Wire representation of an order as the external service sends it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireOrder {
	#[serde(rename = "_id")]
	id: String,
	/// Customer name.
	name: String,
	address: String,
	phone: String,
	#[serde(default)]
	email: String,
	#[serde(default)]
	cart_items: Vec<WireLineItem>,
	order_total: Decimal,
	#[serde(default)]
	is_paid: bool,
	/// Shipping cost charged for the order.
	#[serde(default)]
	amount: Decimal,
	tracking_code: Option<String>,
	status: OrderStatus,
	created_at: DateTime<Utc>,
	#[serde(default = "Utc::now")]
	updated_at: DateTime<Utc>,
}

/// Wire representation of a single cart item.
#[derive(Debug, Deserialize)]
struct WireLineItem {
	#[serde(rename = "_id")]
	id: String,
	name: String,
	#[serde(default)]
	image: String,
	#[serde(default)]
	size: String,
	price: Decimal,
	/// Quantity ordered.
	amount: u32,
}

impl From<WireOrder> for Order {
	fn from(wire: WireOrder) -> Self {
		Order {
			id: wire.id,
			customer_name: wire.name,
			address: wire.address,
			phone: wire.phone,
			email: wire.email,
			items: wire.cart_items.into_iter().map(LineItem::from).collect(),
			order_total: wire.order_total,
			is_paid: wire.is_paid,
			shipping_cost: wire.amount,
			tracking_code: wire.tracking_code,
			status: wire.status,
			created_at: wire.created_at,
			updated_at: wire.updated_at,
		}
	}
}

impl From<WireLineItem> for LineItem {
	fn from(wire: WireLineItem) -> Self {
		LineItem {
			product_id: wire.id,
			name: wire.name,
			image: wire.image,
			size: wire.size,
			unit_price: wire.price,
			quantity: wire.amount,
		}
	}
}

/// Wire representation of a partial order update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WirePatch {
	#[serde(skip_serializing_if = "Option::is_none")]
	status: Option<OrderStatus>,
	#[serde(skip_serializing_if = "Option::is_none")]
	tracking_code: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	expected_status: Option<OrderStatus>,
}

impl From<&OrderPatch> for WirePatch {
	fn from(patch: &OrderPatch) -> Self {
		Self {
			status: patch.status,
			tracking_code: patch.tracking_code.clone(),
			expected_status: patch.expected_status,
		}
	}
}

/// Envelope for list responses.
#[derive(Debug, Deserialize)]
struct OrdersEnvelope {
	orders: Vec<WireOrder>,
}

/// Envelope for single-order responses.
#[derive(Debug, Deserialize)]
struct OrderEnvelope {
	order: WireOrder,
}

/// Configuration schema for HttpOrderStore.
pub struct HttpStoreSchema;

impl HttpStoreSchema {
	fn schema() -> Schema {
		Schema::new(
			vec![
				Field::new("base_url", FieldType::String).with_validator(|value| {
					let url = value.as_str().unwrap_or("");
					if url.starts_with("http://") || url.starts_with("https://") {
						Ok(())
					} else {
						Err("base_url must start with http:// or https://".to_string())
					}
				}),
				Field::new("auth_token", FieldType::String).with_validator(|value| {
					if value.as_str().is_some_and(|s| !s.is_empty()) {
						Ok(())
					} else {
						Err("auth_token must not be empty".to_string())
					}
				}),
			],
			vec![Field::new(
				"timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(300),
				},
			)],
		)
	}
}

impl ConfigSchema for HttpStoreSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Self::schema().validate(config)
	}
}

/// Factory function to create an HTTP store backend from configuration.
pub fn create_store(config: &toml::Value) -> Result<Box<dyn OrderStoreInterface>, StoreError> {
	HttpStoreSchema
		.validate(config)
		.map_err(|e| StoreError::Configuration(e.to_string()))?;

	let base_url = config
		.get("base_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| StoreError::Configuration("base_url is required".to_string()))?
		.to_string();

	let auth_token = config
		.get("auth_token")
		.and_then(|v| v.as_str())
		.ok_or_else(|| StoreError::Configuration("auth_token is required".to_string()))?;

	let timeout = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.map(|s| s as u64)
		.unwrap_or(DEFAULT_TIMEOUT_SECONDS);

	let store = HttpOrderStore::new(
		base_url,
		SecretString::from(auth_token),
		Duration::from_secs(timeout),
	)?;
	Ok(Box::new(store))
}

/// Registry for the HTTP store implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = crate::StoreFactory;

	fn factory() -> Self::Factory {
		create_store
	}
}

impl crate::StoreRegistry for Registry {}
