//! Dashboard metrics over the order collection.
//!
//! A pure reduction recomputed on every fetch; nothing is cached between
//! calls. Cancelled orders are excluded from every count and monetary
//! metric, which is a business rule, not an oversight.

use dispatch_types::{Order, OrderStatus};
use rust_decimal::Decimal;
use serde::Serialize;

/// Headline metrics for the staff dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
	/// Orders awaiting shipment, in collection order.
	pub pending_orders: Vec<Order>,
	/// Count of orders that are not cancelled.
	pub total_orders: usize,
	/// Sum of order totals over non-cancelled orders.
	pub total_revenue: Decimal,
	/// Sum of shipping costs over non-cancelled orders.
	pub total_shipping_cost: Decimal,
}

/// Reduces an order collection to its dashboard summary.
pub fn summarize(orders: &[Order]) -> DashboardSummary {
	let mut summary = DashboardSummary {
		pending_orders: Vec::new(),
		total_orders: 0,
		total_revenue: Decimal::ZERO,
		total_shipping_cost: Decimal::ZERO,
	};

	for order in orders {
		if order.status == OrderStatus::Cancelled {
			continue;
		}
		summary.total_orders += 1;
		summary.total_revenue += order.order_total;
		summary.total_shipping_cost += order.shipping_cost;
		if order.status == OrderStatus::Pending {
			summary.pending_orders.push(order.clone());
		}
	}

	summary
}
