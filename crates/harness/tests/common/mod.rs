//! Shared test infrastructure.

/// Tracing setup and engine helpers.
pub mod context;

/// Mock engines and bridges.
pub mod mocks;
