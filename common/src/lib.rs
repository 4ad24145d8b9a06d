//! Shared building blocks for the capability service.
//!
//! - `config`: environment-driven service configuration and the connections file
//! - `errors`: the application error taxonomy and its HTTP mapping
//! - `models`: connection, capability parameter and query result models
//! - `response`: the unified API response envelope
//! - `middleware`: request id propagation
//! - `utils`: SQL classification helpers

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;
