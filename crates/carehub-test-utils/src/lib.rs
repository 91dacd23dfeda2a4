//! Testing utilities for the CareHub workspace
//!
//! Shared test doubles and fixtures.

#![allow(missing_docs)]

pub mod backend;
pub mod fixtures;

pub use backend::{Call, Failure, FakeBackend};
pub use fixtures::*;
