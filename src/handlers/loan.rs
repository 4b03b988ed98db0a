//! Loan application HTTP handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::loan::{LoanApplication, LoanWithApplicant, SubmitLoanRequest};
use crate::loan_service::{LoanError, LoanService};
use crate::models::ApiResponse;
use crate::policy::{authorize, Caller, Operation};

/// POST /api/loans - Submit a loan application (applicants only)
pub async fn submit_loan(
    State(service): State<Arc<LoanService>>,
    caller: Caller,
    payload: Result<Json<SubmitLoanRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<LoanApplication>>)> {
    // role before body
    authorize(&caller, Operation::SubmitLoan).map_err(LoanError::from)?;
    let Json(request) = payload?;
    let loan = service.submit(&caller, &request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(loan, "Loan application submitted successfully")),
    ))
}

/// GET /api/loans/all - List every application with applicant details (admins only)
pub async fn list_loans(
    State(service): State<Arc<LoanService>>,
    caller: Caller,
) -> ApiResult<Json<ApiResponse<Vec<LoanWithApplicant>>>> {
    let loans = service.list_all(&caller).await?;
    let message = format!("{} loan application(s)", loans.len());

    Ok(Json(ApiResponse::ok(loans, message)))
}

/// PUT /api/loans/:id/approve
pub async fn approve_loan(
    State(service): State<Arc<LoanService>>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ApiResponse<LoanApplication>>> {
    let Path(id) = id?;
    let loan = service.approve(&caller, id).await?;

    Ok(Json(ApiResponse::ok(loan, "Loan approved and email sent")))
}

/// PUT /api/loans/:id/reject
pub async fn reject_loan(
    State(service): State<Arc<LoanService>>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ApiResponse<LoanApplication>>> {
    let Path(id) = id?;
    let loan = service.reject(&caller, id).await?;

    Ok(Json(ApiResponse::ok(loan, "Loan rejected and email sent")))
}

/// DELETE /api/loans/:id
pub async fn delete_loan(
    State(service): State<Arc<LoanService>>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let Path(id) = id?;
    service.delete(&caller, id).await?;

    Ok(Json(ApiResponse::message("Loan deleted successfully")))
}
