//! Filter state for staff-facing list views.
//!
//! A `FilterState` is a plain value owned by the calling view: free-text
//! terms, accepted status and category sets, and activity flags. It is never
//! persisted; after any mutation to the underlying collection the view
//! refetches and reapplies the same state. The filter engine in the core
//! crate interprets it; this module only defines the value and how two
//! states compose.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Composable predicates over a list view.
///
/// All predicates combine by logical AND. An absent (`None`) status or
/// category set matches everything; a present set accepts its members only,
/// so a present-but-empty set matches nothing. The distinction keeps
/// AND-composition of disjoint sets honest instead of collapsing back to
/// match-all. The default state matches the whole collection unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
	/// Free-text search terms; every term must match some searchable field.
	pub terms: Vec<String>,
	/// Accepted status labels; `None` means match-all.
	pub statuses: Option<HashSet<String>>,
	/// Accepted category labels; `None` means match-all.
	pub categories: Option<HashSet<String>>,
	/// Whether active (non-disabled) entries are kept.
	pub show_active: bool,
	/// Whether disabled entries are kept.
	pub show_disabled: bool,
}

impl Default for FilterState {
	fn default() -> Self {
		Self {
			terms: Vec::new(),
			statuses: None,
			categories: None,
			show_active: true,
			show_disabled: true,
		}
	}
}

impl FilterState {
	/// Adds a free-text search term.
	pub fn with_term(mut self, term: impl Into<String>) -> Self {
		self.terms.push(term.into());
		self
	}

	/// Adds a status label to the accepted set.
	pub fn with_status(mut self, status: impl Into<String>) -> Self {
		self.statuses
			.get_or_insert_with(HashSet::new)
			.insert(status.into());
		self
	}

	/// Adds a category label to the accepted set.
	pub fn with_category(mut self, category: impl Into<String>) -> Self {
		self.categories
			.get_or_insert_with(HashSet::new)
			.insert(category.into());
		self
	}

	/// Returns true when this state matches every entry.
	pub fn is_empty(&self) -> bool {
		self.terms.is_empty()
			&& self.statuses.is_none()
			&& self.categories.is_none()
			&& self.show_active
			&& self.show_disabled
	}

	/// Returns the AND-composition of two filter states.
	///
	/// Terms concatenate, the status and category sets intersect (with an
	/// absent set acting as the universe), and the activity flags AND. The
	/// law `apply(apply(c, f1), f2) == apply(c, f1.and(f2))` holds for the
	/// filter engine, including when the two sets are disjoint and the
	/// intersection accepts nothing.
	pub fn and(&self, other: &FilterState) -> FilterState {
		let mut terms = self.terms.clone();
		terms.extend(other.terms.iter().cloned());
		FilterState {
			terms,
			statuses: intersect(&self.statuses, &other.statuses),
			categories: intersect(&self.categories, &other.categories),
			show_active: self.show_active && other.show_active,
			show_disabled: self.show_disabled && other.show_disabled,
		}
	}
}

/// Intersects two accepted sets, treating an absent set as match-all.
fn intersect(a: &Option<HashSet<String>>, b: &Option<HashSet<String>>) -> Option<HashSet<String>> {
	match (a, b) {
		(None, None) => None,
		(Some(set), None) | (None, Some(set)) => Some(set.clone()),
		(Some(a), Some(b)) => Some(a.intersection(b).cloned().collect()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_matches_all() {
		assert!(FilterState::default().is_empty());
	}

	#[test]
	fn test_and_concatenates_terms() {
		let combined = FilterState::default()
			.with_term("alice")
			.and(&FilterState::default().with_term("0909"));
		assert_eq!(combined.terms, vec!["alice", "0909"]);
	}

	#[test]
	fn test_and_intersects_statuses() {
		let f1 = FilterState::default()
			.with_status("Shipping")
			.with_status("Delivered");
		let f2 = FilterState::default()
			.with_status("Shipping")
			.with_status("Cancelled");
		let combined = f1.and(&f2);
		let statuses = combined.statuses.as_ref().unwrap();
		assert_eq!(statuses.len(), 1);
		assert!(statuses.contains("Shipping"));
	}

	#[test]
	fn test_absent_status_set_is_universe() {
		let f1 = FilterState::default();
		let f2 = FilterState::default().with_status("Pending");
		assert_eq!(f1.and(&f2).statuses, f2.statuses);
		assert_eq!(f2.and(&f1).statuses, f2.statuses);
	}

	#[test]
	fn test_disjoint_status_sets_compose_to_match_none() {
		let f1 = FilterState::default().with_status("Pending");
		let f2 = FilterState::default().with_status("Shipping");
		let combined = f1.and(&f2);
		// Empty-but-present is match-none, not a collapse back to match-all.
		assert_eq!(combined.statuses, Some(HashSet::new()));
		assert!(!combined.is_empty());
	}

	#[test]
	fn test_and_flags() {
		let mut f1 = FilterState::default();
		f1.show_disabled = false;
		let combined = f1.and(&FilterState::default());
		assert!(combined.show_active);
		assert!(!combined.show_disabled);
	}
}
