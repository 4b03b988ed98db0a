//! Application state shared across handlers

use std::sync::Arc;

use crate::account_service::AccountService;
use crate::auth::TokenVerifier;
use crate::loan_service::LoanService;

use axum::extract::FromRef;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub loan_service: Arc<LoanService>,
    pub account_service: Arc<AccountService>,
    pub token_verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(
        loan_service: Arc<LoanService>,
        account_service: Arc<AccountService>,
        token_verifier: Arc<TokenVerifier>,
    ) -> Self {
        Self {
            loan_service,
            account_service,
            token_verifier,
        }
    }
}

impl FromRef<AppState> for Arc<LoanService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.loan_service.clone()
    }
}

impl FromRef<AppState> for Arc<AccountService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.account_service.clone()
    }
}

impl FromRef<AppState> for Arc<TokenVerifier> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.token_verifier.clone()
    }
}
