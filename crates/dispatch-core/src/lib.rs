//! Core order lifecycle engine for the dispatch system.
//!
//! This crate ties the order store and the carrier gateway together: the
//! lifecycle service owns every status transition, the filter engine slices
//! order collections for staff views, and the dashboard module reduces a
//! collection to its headline metrics.

pub mod dashboard;
pub mod filter;
pub mod lifecycle;

pub use dashboard::{summarize, DashboardSummary};
pub use filter::{apply, matches, Filterable};
pub use lifecycle::{LifecycleError, LifecycleService};
