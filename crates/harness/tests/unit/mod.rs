//! # Unit Components
//!
//! This module organizes the tests of every harness layer, leaves first.


/// Configuration defaults, JSON loading, and plusargs.
pub mod config;


/// Cycle counter under blocking and non-blocking stepping.
pub mod stepping;


/// Bridge registry and the built-in bridges.
pub mod bridges;
