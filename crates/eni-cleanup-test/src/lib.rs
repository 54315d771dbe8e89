//! Test infrastructure for orphaned ENI cleanup
//!
//! Provides:
//! - Record fixtures for common interface shapes
//! - An in-memory provider gateway with fault injection and a call journal
//! - Summary and tag verification helpers

pub mod fixtures;
mod gateway;
mod verification;

pub use fixtures::*;
pub use gateway::{Call, InMemoryGateway, InMemoryGatewayFactory, Operation};
pub use verification::*;
