//! FBIP Test Harness - Fixtures and protocol validation
//!
//! This crate provides:
//! - Deterministic event fixtures
//! - Seeded packet corruption
//! - End-to-end scenarios over the protocol facade

pub mod corruption;
pub mod fixtures;
pub mod integration;

pub use corruption::*;
pub use fixtures::*;
pub use integration::*;
