//! Carrier types for the dispatch system.
//!
//! These types describe the boundary with the external shipping carrier:
//! the credentials used to log in, the session token obtained from a login,
//! and the shipment-creation request built from an order plus the configured
//! sender profile.

use crate::secret_string::SecretString;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Credentials for authenticating with the carrier partner API.
#[derive(Debug, Clone, Deserialize)]
pub struct CarrierCredentials {
	/// Partner account username.
	pub username: String,
	/// Partner account password; never logged or serialized in clear.
	pub password: SecretString,
}

/// An authenticated carrier session.
///
/// Owned exclusively by the carrier service. A session is obtained lazily on
/// first use, shared by concurrent callers, and replaced whenever the
/// carrier rejects its token. It is never persisted.
#[derive(Debug, Clone)]
pub struct CarrierSession {
	/// Token returned by the carrier login endpoint.
	pub token: SecretString,
	/// When this session was obtained.
	pub issued_at: DateTime<Utc>,
}

impl CarrierSession {
	/// Creates a session from a freshly issued token.
	pub fn new(token: impl Into<SecretString>) -> Self {
		Self {
			token: token.into(),
			issued_at: Utc::now(),
		}
	}
}

/// A shipment-creation request submitted to the carrier.
///
/// Receiver fields come from the order; sender fields and the product
/// descriptor come from the configured sender profile. The collect amount is
/// the order total (cash on delivery).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRequest {
	/// Shop name printed on the waybill.
	pub sender_name: String,
	/// Shop pickup address.
	pub sender_address: String,
	/// Shop contact phone.
	pub sender_phone: String,
	/// Receiver full name, taken from the order's customer name.
	pub receiver_name: String,
	/// Receiver delivery address.
	pub receiver_address: String,
	/// Receiver phone number.
	pub receiver_phone: String,
	/// Product descriptor shown to the carrier.
	pub product_name: String,
	/// Number of parcels.
	pub product_quantity: u32,
	/// Declared product value.
	pub product_price: Decimal,
	/// Parcel weight in grams.
	pub product_weight_grams: u32,
	/// Carrier product type code.
	pub product_type: String,
	/// Carrier payment mode code.
	pub payment_mode: u8,
	/// Carrier service code selecting the delivery product.
	pub service_code: String,
	/// Free-text note printed for the courier.
	pub note: String,
	/// Amount the courier collects from the receiver on delivery.
	pub collect_amount: Decimal,
}

impl ShipmentRequest {
	/// Validates the receiver fields before any network call is made.
	///
	/// A request with a missing receiver name, address, or phone is rejected
	/// here so the carrier is never contacted with a malformed shipment.
	pub fn validate(&self) -> Result<(), String> {
		if self.receiver_name.trim().is_empty() {
			return Err("receiver name is empty".to_string());
		}
		if self.receiver_address.trim().is_empty() {
			return Err("receiver address is empty".to_string());
		}
		if self.receiver_phone.trim().is_empty() {
			return Err("receiver phone is empty".to_string());
		}
		Ok(())
	}
}

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
			collect_amount: Decimal::from(1_000_000),
		}
	}

	#[test]
	fn test_valid_request_passes() {
		assert!(request().validate().is_ok());
	}

	#[test]
	fn test_blank_receiver_fields_rejected() {
		let mut missing_name = request();
		missing_name.receiver_name = "  ".to_string();
		assert!(missing_name.validate().is_err());

		let mut missing_address = request();
		missing_address.receiver_address = String::new();
		assert!(missing_address.validate().is_err());

		let mut missing_phone = request();
		missing_phone.receiver_phone = String::new();
		assert!(missing_phone.validate().is_err());
	}

	#[test]
	fn test_session_token_redacted_in_debug() {
		let session = CarrierSession::new("secret-token");
		let debug = format!("{:?}", session);
		assert!(!debug.contains("secret-token"));
	}
}
