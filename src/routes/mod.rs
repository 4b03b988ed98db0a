//! Route definitions for LoanDesk API

mod admin;
mod loan;

use axum::{routing::get, Router};

use crate::handlers::{health_check, root};
use crate::state::AppState;

pub use admin::admin_routes;
pub use loan::loan_routes;

pub fn system_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}

/// Full API router bound to its state. Cross-cutting layers are added by the caller.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(system_routes())
        .merge(loan_routes())
        .merge(admin_routes())
        .with_state(state)
}
