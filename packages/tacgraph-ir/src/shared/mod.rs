//! Shared module - types and helpers used by every feature
//!
//! Depends on nothing else in the crate.

pub mod constants;
pub mod models;
pub mod utils;

pub use models::*;
