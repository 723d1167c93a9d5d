//! HTTP server for the dispatch API.
//!
//! Exposes the lifecycle operations, the filter engine, and the dashboard
//! reduction to staff-facing views. Every lifecycle failure maps to a
//! distinct status code so callers can tell a stale view (conflict) from a
//! carrier outage (bad gateway) from a bad request.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Json, Response},
	routing::{delete, get, patch, post},
	Router,
};
use dispatch_carrier::CarrierError;
use dispatch_config::ApiConfig;
use dispatch_core::{summarize, LifecycleError, LifecycleService};
use dispatch_store::StoreError;
use dispatch_types::{FilterState, Order, OrderStatus};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Lifecycle service all operations go through.
	pub lifecycle: Arc<LifecycleService>,
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	lifecycle: Arc<LifecycleService>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app_state = AppState { lifecycle };

	let app = Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/orders", get(handle_list_orders))
				.route("/orders/pending", get(handle_list_pending))
				.route("/orders/{id}", get(handle_get_order))
				.route("/orders/{id}", delete(handle_delete_order))
				.route("/orders/{id}/shipment", post(handle_create_shipment))
				.route("/orders/{id}/status", patch(handle_update_status))
				.route("/dashboard", get(handle_dashboard)),
		)
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(app_state);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Dispatch API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Query parameters accepted by the order list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
	/// Status label to restrict the listing to.
	pub status: Option<String>,
	/// Free-text search; whitespace-separated terms all must match.
	pub search: Option<String>,
}

impl ListQuery {
	/// Converts the raw query into a filter state.
	fn filter_state(&self) -> FilterState {
		let mut filter = FilterState::default();
		if let Some(status) = &self.status {
			filter = filter.with_status(status.clone());
		}
		if let Some(search) = &self.search {
			for term in search.split_whitespace() {
				filter = filter.with_term(term);
			}
		}
		filter
	}
}

/// Handles GET /api/orders requests.
///
/// Fetches the full collection and applies the requested filter, preserving
/// the store's ordering.
async fn handle_list_orders(
	State(state): State<AppState>,
	Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
	let orders = state.lifecycle.list_all().await?;
	Ok(Json(dispatch_core::filter::apply(
		&orders,
		&query.filter_state(),
	)))
}

/// Handles GET /api/orders/pending requests.
async fn handle_list_pending(
	State(state): State<AppState>,
) -> Result<Json<Vec<Order>>, ApiError> {
	Ok(Json(state.lifecycle.list_pending().await?))
}

/// Handles GET /api/orders/{id} requests.
async fn handle_get_order(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Order>, ApiError> {
	Ok(Json(state.lifecycle.get_order(&id).await?))
}

/// Handles POST /api/orders/{id}/shipment requests.
///
/// Creates the carrier shipment and returns the order in its new state,
/// tracking code included.
async fn handle_create_shipment(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Order>, ApiError> {
	match state.lifecycle.create_shipment(&id).await {
		Ok(order) => Ok(Json(order)),
		Err(e) => {
			tracing::warn!(order_id = %id, "shipment creation failed: {}", e);
			Err(ApiError(e))
		},
	}
}

/// Request body for status updates.
#[derive(Debug, Deserialize)]
struct StatusUpdate {
	status: OrderStatus,
}

/// Handles PATCH /api/orders/{id}/status requests.
async fn handle_update_status(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(body): Json<StatusUpdate>,
) -> Result<Json<Order>, ApiError> {
	Ok(Json(state.lifecycle.update_status(&id, body.status).await?))
}

/// Handles DELETE /api/orders/{id} requests.
async fn handle_delete_order(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
	state.lifecycle.delete(&id).await?;
	Ok(StatusCode::NO_CONTENT)
}

/// Handles GET /api/dashboard requests.
async fn handle_dashboard(
	State(state): State<AppState>,
) -> Result<Json<dispatch_core::DashboardSummary>, ApiError> {
	let orders = state.lifecycle.list_all().await?;
	Ok(Json(summarize(&orders)))
}

/// Wrapper mapping lifecycle errors onto HTTP responses.
pub struct ApiError(LifecycleError);

impl From<LifecycleError> for ApiError {
	fn from(err: LifecycleError) -> Self {
		ApiError(err)
	}
}

/// Maps a lifecycle error to the status code the API reports.
fn status_for(err: &LifecycleError) -> StatusCode {
	match err {
		LifecycleError::OrderNotFound(_) => StatusCode::NOT_FOUND,
		LifecycleError::InvalidTransition { .. } | LifecycleError::OperationInFlight(_) => {
			StatusCode::CONFLICT
		},
		LifecycleError::Validation(_) => StatusCode::BAD_REQUEST,
		LifecycleError::Carrier(CarrierError::Validation(_)) => StatusCode::BAD_REQUEST,
		LifecycleError::Carrier(_) => StatusCode::BAD_GATEWAY,
		LifecycleError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
		LifecycleError::Store(StoreError::Network(_) | StoreError::Auth(_)) => {
			StatusCode::BAD_GATEWAY
		},
		LifecycleError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = status_for(&self.0);
		let body = Json(serde_json::json!({
			"error": self.0.to_string(),
		}));
		(status, body).into_response()
	}
}
