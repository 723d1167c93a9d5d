//! Filter engine for staff-facing list views.
//!
//! A pure function over an ordered collection and a
//! [`FilterState`](dispatch_types::FilterState): predicates combine by
//! logical AND, the output preserves the input order, and the source
//! collection is never mutated. Views refetch and reapply the same state
//! after any mutation.

use dispatch_types::{FilterState, Order};

/// An entry a [`FilterState`] can be evaluated against.
///
/// List views share one engine across orders, products, and users; each
/// entry type declares which of its fields are text-searchable and how it
/// maps onto the status, category, and activity predicates.
pub trait Filterable {
	/// Fields the free-text terms are matched against.
	fn text_fields(&self) -> Vec<&str>;

	/// Label matched against the accepted status set.
	fn status_label(&self) -> &str;

	/// Label matched against the accepted category set, if the entry has one.
	fn category(&self) -> Option<&str> {
		None
	}

	/// Whether the entry counts as disabled for the activity flags.
	fn is_disabled(&self) -> bool {
		false
	}
}

impl Filterable for Order {
	fn text_fields(&self) -> Vec<&str> {
		let mut fields = vec![
			self.id.as_str(),
			self.customer_name.as_str(),
			self.phone.as_str(),
			self.email.as_str(),
		];
		if let Some(code) = self.tracking_code.as_deref() {
			fields.push(code);
		}
		fields
	}

	fn status_label(&self) -> &str {
		self.status.as_str()
	}
}

/// Returns true when the entry passes every predicate in the filter.
pub fn matches<T: Filterable>(entry: &T, filter: &FilterState) -> bool {
	// Every term must match some searchable field, case-insensitively.
	for term in &filter.terms {
		let term = term.to_lowercase();
		let hit = entry
			.text_fields()
			.iter()
			.any(|field| field.to_lowercase().contains(&term));
		if !hit {
			return false;
		}
	}

	// An absent accepted set matches everything; a present set accepts its
	// members only, so a composed-empty set rejects every entry.
	if let Some(statuses) = &filter.statuses {
		if !statuses.contains(entry.status_label()) {
			return false;
		}
	}
	if let Some(categories) = &filter.categories {
		match entry.category() {
			Some(category) if categories.contains(category) => {},
			_ => return false,
		}
	}

	if entry.is_disabled() {
		filter.show_disabled
	} else {
		filter.show_active
	}
}

/// Applies a filter to a collection, preserving the input order.
pub fn apply<T: Filterable + Clone>(collection: &[T], filter: &FilterState) -> Vec<T> {
	collection
		.iter()
		.filter(|entry| matches(*entry, filter))
		.cloned()
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;
	use dispatch_types::OrderStatus;
	use rust_decimal::Decimal;

	fn order(id: &str, name: &str, status: OrderStatus, tracking_code: Option<&str>) -> Order {
		Order {
			id: id.to_string(),
			customer_name: name.to_string(),
			address: "12 Le Loi".to_string(),
			phone: "0909000111".to_string(),
			email: format!("{}@example.com", id),
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

	fn collection() -> Vec<Order> {
		vec![
			order("a", "Nguyen Van An", OrderStatus::Pending, None),
			order("b", "Tran Thi Binh", OrderStatus::Shipping, Some("VT10")),
			order("c", "Le Van Cuong", OrderStatus::Delivered, Some("VT11")),
			order("d", "Pham Thi Dung", OrderStatus::Cancelled, None),
		]
	}

	#[test]
	fn test_empty_filter_is_identity() {
		let orders = collection();
		let filtered = apply(&orders, &FilterState::default());
		let ids: Vec<&str> = filtered.iter().map(|o| o.id.as_str()).collect();
		assert_eq!(ids, vec!["a", "b", "c", "d"]);
	}

	#[test]
	fn test_text_search_is_case_insensitive() {
		let orders = collection();
		let filtered = apply(&orders, &FilterState::default().with_term("nguyen VAN"));
		assert_eq!(filtered.len(), 1);
		assert_eq!(filtered[0].id, "a");
	}

	#[test]
	fn test_text_search_covers_tracking_code() {
		let orders = collection();
		let filtered = apply(&orders, &FilterState::default().with_term("vt10"));
		assert_eq!(filtered.len(), 1);
		assert_eq!(filtered[0].id, "b");
	}

	#[test]
	fn test_status_set_filters_and_preserves_order() {
		let orders = collection();
		let filter = FilterState::default()
			.with_status("Pending")
			.with_status("Delivered");
		let ids: Vec<String> = apply(&orders, &filter).into_iter().map(|o| o.id).collect();
		assert_eq!(ids, vec!["a", "c"]);
	}

	#[test]
	fn test_sequential_application_equals_composed() {
		let orders = collection();
		let f1 = FilterState::default().with_term("van");
		let f2 = FilterState::default()
			.with_status("Pending")
			.with_status("Shipping");

		let sequential = apply(&apply(&orders, &f1), &f2);
		let composed = apply(&orders, &f1.and(&f2));

		let seq_ids: Vec<String> = sequential.into_iter().map(|o| o.id).collect();
		let comp_ids: Vec<String> = composed.into_iter().map(|o| o.id).collect();
		assert_eq!(seq_ids, comp_ids);
		assert_eq!(seq_ids, vec!["a"]);
	}

	#[test]
	fn test_disjoint_status_sets_compose_to_empty() {
		let orders = collection();
		let f1 = FilterState::default().with_status("Pending");
		let f2 = FilterState::default().with_status("Shipping");

		let sequential = apply(&apply(&orders, &f1), &f2);
		let composed = apply(&orders, &f1.and(&f2));

		assert!(sequential.is_empty());
		assert!(composed.is_empty());
	}

	#[test]
	fn test_all_terms_must_match() {
		let orders = collection();
		let filter = FilterState::default().with_term("tran").with_term("0909");
		let filtered = apply(&orders, &filter);
		assert_eq!(filtered.len(), 1);
		assert_eq!(filtered[0].id, "b");

		let none = apply(&orders, &FilterState::default().with_term("tran").with_term("zzz"));
		assert!(none.is_empty());
	}

	#[test]
	fn test_source_collection_untouched() {
		let orders = collection();
		let _ = apply(&orders, &FilterState::default().with_term("binh"));
		assert_eq!(orders.len(), 4);
	}

	#[test]
	fn test_activity_flags() {
		struct Entry {
			name: &'static str,
			disabled: bool,
		}
		impl Filterable for Entry {
			fn text_fields(&self) -> Vec<&str> {
				vec![self.name]
			}
			fn status_label(&self) -> &str {
				""
			}
			fn is_disabled(&self) -> bool {
				self.disabled
			}
		}

		let active = Entry {
			name: "runner",
			disabled: false,
		};
		let disabled = Entry {
			name: "legacy",
			disabled: true,
		};

		let mut only_active = FilterState::default();
		only_active.show_disabled = false;
		assert!(matches(&active, &only_active));
		assert!(!matches(&disabled, &only_active));

		let mut only_disabled = FilterState::default();
		only_disabled.show_active = false;
		assert!(!matches(&active, &only_disabled));
		assert!(matches(&disabled, &only_disabled));
	}
}
