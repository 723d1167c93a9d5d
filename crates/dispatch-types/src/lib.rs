//! Common types module for the dispatch back-office system.
//!
//! This module defines the core data types and structures shared by all
//! dispatch components. It provides a centralized location for the order
//! data model, carrier types, filter state, and configuration plumbing to
//! ensure consistency across the workspace.

/// Carrier types for sessions, credentials, and shipment requests.
pub mod carrier;
/// Filter state applied by staff-facing list views.
pub mod filter;
/// Order data model including line items, statuses, and patches.
pub mod order;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Secure string type for passwords and bearer tokens.
pub mod secret_string;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use carrier::*;
pub use filter::*;
pub use order::*;
pub use registry::*;
pub use secret_string::*;
pub use validation::*;
