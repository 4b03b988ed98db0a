//! LoanDesk Backend Library
//!
//! This library exports the core modules for the LoanDesk backend server:
//! loan application intake, the admin review lifecycle and applicant notification.

pub mod account_service;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod loan;
pub mod loan_service;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod policy;
pub mod routes;
pub mod state;
pub mod store;
