//! Berth Shared - Common types for the adapter and runtime clients
//!
//! This crate holds the error taxonomy and constants used on both sides
//! of the adapter/runtime-client boundary.

pub mod constants;
pub mod errors;

pub use errors::{BerthError, BerthResult, RuntimeError, RuntimeResult};
