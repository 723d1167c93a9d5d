//! ViettelPost carrier implementation.
//!
//! Talks to the ViettelPost partner API. Login exchanges the partner
//! credentials for a token at `/v2/user/Login`; shipments are created at
//! `/v2/order/createOrder` with the token in the `Token` header. The API
//! speaks UPPER_SNAKE field names and numeric money amounts, which this
//! module maps from the internal shipment request.

use crate::{CarrierError, CarrierInterface, CarrierRegistry};
use async_trait::async_trait;
use dispatch_types::{
	CarrierCredentials, CarrierSession, ConfigSchema, Field, FieldType, ImplementationRegistry,
	Schema, ShipmentRequest, ValidationError,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Production partner API endpoint.
const DEFAULT_BASE_URL: &str = "https://partner.viettelpost.vn";
/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// ViettelPost carrier implementation.
pub struct ViettelCarrier {
	client: reqwest::Client,
	base_url: String,
}

impl ViettelCarrier {
	/// Creates a carrier client against the given partner API base URL.
	pub fn new(base_url: String, timeout: Duration) -> Result<Self, CarrierError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| {
				CarrierError::Configuration(format!("Failed to build HTTP client: {}", e))
			})?;

		Ok(Self {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
		})
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	/// Maps a non-success HTTP status to a carrier error.
	fn map_status(status: reqwest::StatusCode, body: String) -> CarrierError {
		match status.as_u16() {
			401 | 403 => CarrierError::Auth(body),
			_ => CarrierError::Network(format!("HTTP {}: {}", status, body)),
		}
	}
}

#[async_trait]
impl CarrierInterface for ViettelCarrier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(ViettelCarrierSchema)
	}

	async fn authenticate(
		&self,
		credentials: &CarrierCredentials,
	) -> Result<CarrierSession, CarrierError> {
		let body = LoginRequest {
			username: credentials.username.clone(),
			password: credentials.password.expose_secret().to_string(),
		};

		let response = self
			.client
			.post(self.url("/v2/user/Login"))
			.json(&body)
			.send()
			.await
			.map_err(|e| CarrierError::Network(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			let text = response.text().await.unwrap_or_default();
			return Err(Self::map_status(status, text));
		}

		let login: LoginResponse = response
			.json()
			.await
			.map_err(|e| CarrierError::Network(format!("Malformed login response: {}", e)))?;

		match login.data.and_then(|d| d.token).filter(|t| !t.is_empty()) {
			Some(token) => Ok(CarrierSession::new(token)),
			None => Err(CarrierError::Auth(
				"Login response contained no token".to_string(),
			)),
		}
	}

	async fn create_shipment(
		&self,
		session: &CarrierSession,
		request: &ShipmentRequest,
	) -> Result<String, CarrierError> {
		let body = ViettelShipment::from(request);

		let response = self
			.client
			.post(self.url("/v2/order/createOrder"))
			.header("Token", session.token.expose_secret())
			.json(&body)
			.send()
			.await
			.map_err(|e| CarrierError::Network(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			let text = response.text().await.unwrap_or_default();
			return Err(Self::map_status(status, text));
		}

		let created: CreateOrderResponse = response
			.json()
			.await
			.map_err(|e| CarrierError::Network(format!("Malformed carrier response: {}", e)))?;

		// A 2xx without an order number means the carrier-side outcome is
		// unknown; surfaced as its own error and never retried.
		created
			.data
			.and_then(|d| d.order_number)
			.filter(|n| !n.is_empty())
			.ok_or(CarrierError::MissingOrderNumber)
	}
}

#[derive(Debug, Serialize)]
struct LoginRequest {
	#[serde(rename = "USERNAME")]
	username: String,
	#[serde(rename = "PASSWORD")]
	password: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
	data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
	token: Option<String>,
}

/// Shipment payload in the partner API's wire shape.
#[derive(Debug, Serialize)]
struct ViettelShipment {
	#[serde(rename = "SENDER_FULLNAME")]
	sender_fullname: String,
	#[serde(rename = "SENDER_ADDRESS")]
	sender_address: String,
	#[serde(rename = "SENDER_PHONE")]
	sender_phone: String,
	#[serde(rename = "RECEIVER_FULLNAME")]
	receiver_fullname: String,
	#[serde(rename = "RECEIVER_ADDRESS")]
	receiver_address: String,
	#[serde(rename = "RECEIVER_PHONE")]
	receiver_phone: String,
	#[serde(rename = "PRODUCT_NAME")]
	product_name: String,
	#[serde(rename = "PRODUCT_QUANTITY")]
	product_quantity: u32,
	#[serde(rename = "PRODUCT_PRICE", with = "rust_decimal::serde::float")]
	product_price: Decimal,
	#[serde(rename = "PRODUCT_WEIGHT")]
	product_weight: u32,
	#[serde(rename = "PRODUCT_TYPE")]
	product_type: String,
	#[serde(rename = "ORDER_PAYMENT")]
	order_payment: u8,
	#[serde(rename = "ORDER_SERVICE")]
	order_service: String,
	#[serde(rename = "ORDER_NOTE")]
	order_note: String,
	#[serde(rename = "MONEY_COLLECTION", with = "rust_decimal::serde::float")]
	money_collection: Decimal,
}

impl From<&ShipmentRequest> for ViettelShipment {
	fn from(request: &ShipmentRequest) -> Self {
		Self {
			sender_fullname: request.sender_name.clone(),
			sender_address: request.sender_address.clone(),
			sender_phone: request.sender_phone.clone(),
			receiver_fullname: request.receiver_name.clone(),
			receiver_address: request.receiver_address.clone(),
			receiver_phone: request.receiver_phone.clone(),
			product_name: request.product_name.clone(),
			product_quantity: request.product_quantity,
			product_price: request.product_price,
			product_weight: request.product_weight_grams,
			product_type: request.product_type.clone(),
			order_payment: request.payment_mode,
			order_service: request.service_code.clone(),
			order_note: request.note.clone(),
			money_collection: request.collect_amount,
		}
	}
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
	data: Option<CreateOrderData>,
}

#[derive(Debug, Deserialize)]
struct CreateOrderData {
	#[serde(rename = "ORDER_NUMBER")]
	order_number: Option<String>,
}

/// Configuration schema for ViettelCarrier.
pub struct ViettelCarrierSchema;

impl ViettelCarrierSchema {
	fn schema() -> Schema {
		Schema::new(
			vec![],
			vec![
				Field::new("base_url", FieldType::String).with_validator(|value| {
					let url = value.as_str().unwrap_or("");
					if url.starts_with("http://") || url.starts_with("https://") {
						Ok(())
					} else {
						Err("base_url must start with http:// or https://".to_string())
					}
				}),
				Field::new(
					"timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(300),
					},
				),
			],
		)
	}
}

impl ConfigSchema for ViettelCarrierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Self::schema().validate(config)
	}
}

/// Factory function to create a ViettelPost carrier from configuration.
pub fn create_carrier(config: &toml::Value) -> Result<Box<dyn CarrierInterface>, CarrierError> {
	ViettelCarrierSchema
		.validate(config)
		.map_err(|e| CarrierError::Configuration(e.to_string()))?;

	let base_url = config
		.get("base_url")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_BASE_URL)
		.to_string();

	let timeout = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.map(|s| s as u64)
		.unwrap_or(DEFAULT_TIMEOUT_SECONDS);

	let carrier = ViettelCarrier::new(base_url, Duration::from_secs(timeout))?;
	Ok(Box::new(carrier))
}

/// Registry for the ViettelPost carrier implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "viettel";
	type Factory = crate::CarrierFactory;

	fn factory() -> Self::Factory {
		create_carrier
	}
}

impl CarrierRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

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
			collect_amount: Decimal::from(1_250_000),
		}
	}

	#[test]
	fn test_shipment_wire_shape() {
		let json = serde_json::to_value(ViettelShipment::from(&request())).unwrap();

		assert_eq!(json["SENDER_FULLNAME"], "DH Sneaker");
		assert_eq!(json["RECEIVER_FULLNAME"], "Nguyen Van A");
		assert_eq!(json["PRODUCT_WEIGHT"], 250);
		assert_eq!(json["ORDER_PAYMENT"], 3);
		assert_eq!(json["ORDER_SERVICE"], "VSL7");
		assert_eq!(json["MONEY_COLLECTION"], 1_250_000.0);
	}

	#[test]
	fn test_missing_order_number_detected() {
		let empty: CreateOrderResponse = serde_json::from_str(r#"{"data": {}}"#).unwrap();
		assert!(empty.data.and_then(|d| d.order_number).is_none());

		let no_data: CreateOrderResponse = serde_json::from_str(r#"{"status": 200}"#).unwrap();
		assert!(no_data.data.is_none());

		let ok: CreateOrderResponse =
			serde_json::from_str(r#"{"data": {"ORDER_NUMBER": "123456789"}}"#).unwrap();
		assert_eq!(ok.data.unwrap().order_number.as_deref(), Some("123456789"));
	}

	#[test]
	fn test_schema_rejects_bad_base_url() {
		let config: toml::Value = r#"base_url = "partner.viettelpost.vn""#.parse().unwrap();
		assert!(ViettelCarrierSchema.validate(&config).is_err());
	}

	#[test]
	fn test_factory_uses_default_endpoint() {
		let config: toml::Value = "".parse().unwrap();
		assert!(create_carrier(&config).is_ok());
	}
}
