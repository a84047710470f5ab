//! Mock collaborators.
//!
//! `mockall` cannot return borrows of `self` (`target_name`, `as_any`), so each mock covers
//! the behavioral methods only and a thin wrapper supplies the rest.

/// Mock bridge.
pub mod bridge;

/// Mock simulation engine.
pub mod engine;
