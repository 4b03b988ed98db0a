//! Loan route definitions

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/api/loans", post(submit_loan))
        .route("/api/loans/all", get(list_loans))
        .route("/api/loans/:id", delete(delete_loan))
        .route("/api/loans/:id/approve", put(approve_loan))
        .route("/api/loans/:id/reject", put(reject_loan))
}
