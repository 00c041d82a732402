//! Shared types, errors, and configuration for the ledger generation engine.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Currency codes and money values with decimal precision
//! - The boundary error type returned to callers
//! - Engine configuration management

pub mod config;
pub mod error;
pub mod types;

pub use self::config::EngineConfig;
pub use error::{CommonError, CommonResult};
