//! Account administration handlers

use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::account_service::AccountService;
use crate::error::ApiResult;
use crate::models::{ApiResponse, User};
use crate::policy::Caller;

/// POST /api/admin/approve/:id - Approve a user account and email its owner
pub async fn approve_account(
    State(service): State<Arc<AccountService>>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let Path(id) = id?;
    let user = service.approve_account(&caller, id).await?;

    Ok(Json(ApiResponse::ok(user, "User approved and email sent")))
}
