//! # Route Modules
//!
//! - `operator`: `/-/health` and `/-/status`, outside repository space.
//! - `repository`: the fallback that hands every other request to the
//!   [`RepositoryController`](crate::controller::RepositoryController).

pub mod operator;
pub mod repository;
