//! # Middleware
//!
//! Request-level concerns applied around every route.

pub mod metrics;
