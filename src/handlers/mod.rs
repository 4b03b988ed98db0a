//! API handlers for LoanDesk backend

pub mod admin;
pub mod loan;
pub mod system;

pub use admin::approve_account;
pub use loan::*;
pub use system::{health_check, root};
