//! Account administration routes

use axum::{routing::post, Router};

use crate::handlers::approve_account;
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/api/admin/approve/:id", post(approve_account))
}
