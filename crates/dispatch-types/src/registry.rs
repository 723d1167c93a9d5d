//! Registry trait for self-registering implementations.
//!
//! Each pluggable boundary (the order store, the carrier) ships one or more
//! implementations selected by name from configuration. Every implementation
//! module provides a `Registry` type implementing this trait so the service
//! wiring can enumerate what is available.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// for example "http" for `store.implementations.http` or "viettel" for
	/// `carrier.implementations.viettel`.
	const NAME: &'static str;

	/// The factory function type this implementation provides. Each boundary
	/// crate defines its own factory signature.
	type Factory;

	/// Returns the factory function for this implementation.
	fn factory() -> Self::Factory;
}
