//! API client library for anidex.
//!
//! Provides a rate-limited client for the Jikan anime catalog and a
//! direct client for the account backend.

mod error;

/// Jikan catalog client.
pub mod jikan;

/// Account backend client.
pub mod session;

pub use error::{ApiError, Result};
