//! Middleware for LoanDesk API
//!
//! This module provides middleware for request tracing, security headers,
//! and caller authentication.

pub mod auth;
mod security;
mod tracing;

pub use security::{hsts_header, security_headers};
pub use self::tracing::request_tracing;
