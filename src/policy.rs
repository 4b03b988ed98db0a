//! Role-based authorization gate
//!
//! Every service operation reachable from the API calls [`authorize`] before
//! touching a store.

use uuid::Uuid;

use crate::models::UserRole;

/// Verified identity of the party making a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Caller {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SubmitLoan,
    ListLoans,
    ApproveLoan,
    RejectLoan,
    DeleteLoan,
    ApproveAccount,
}

impl Operation {
    pub fn required_role(&self) -> UserRole {
        match self {
            Operation::SubmitLoan => UserRole::User,
            Operation::ListLoans
            | Operation::ApproveLoan
            | Operation::RejectLoan
            | Operation::DeleteLoan
            | Operation::ApproveAccount => UserRole::Admin,
        }
    }
}

/// Denied operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("role {role:?} may not perform {operation:?}")]
pub struct Forbidden {
    pub operation: Operation,
    pub role: UserRole,
}

pub fn authorize(caller: &Caller, operation: Operation) -> Result<(), Forbidden> {
    if caller.role == operation.required_role() {
        Ok(())
    } else {
        Err(Forbidden {
            operation,
            role: caller.role,
        })
    }
}
