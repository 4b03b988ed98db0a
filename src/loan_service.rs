//! Loan service layer - Business logic for the loan application lifecycle

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::loan::{LoanApplication, LoanStatus, LoanWithApplicant, SubmitLoanRequest};
use crate::models::ApplicantSummary;
use crate::notify::{send_bounded, templates, Message, Notification, Notifier, NotifyError};
use crate::policy::{authorize, Caller, Forbidden, Operation};
use crate::store::{LoanStore, StatusUpdate, StoreError, UserStore};

/// Lifecycle errors
#[derive(Error, Debug)]
pub enum LoanError {
    #[error("All fields are required (missing: {})", .0.join(", "))]
    MissingField(Vec<&'static str>),

    /// Carries the amount as received.
    #[error("Loan amount cannot exceed 1,000,000")]
    AmountExceeded(String),

    #[error("Loan amount must be a positive whole number")]
    InvalidAmount(String),

    #[error("Invalid loan category")]
    InvalidCategory(String),

    #[error(transparent)]
    Forbidden(#[from] Forbidden),

    #[error("Loan not found")]
    NotFound(Uuid),

    #[error("Loan is already {from} and cannot become {to}")]
    InvalidTransition {
        id: Uuid,
        from: LoanStatus,
        to: LoanStatus,
    },

    #[error("Applicant {applicant_id} of loan {loan_id} not found")]
    ApplicantNotFound { loan_id: Uuid, applicant_id: Uuid },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Notification failed: {0}")]
    Notification(#[from] NotifyError),
}

/// Administrator decision on a pending application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn target_status(&self) -> LoanStatus {
        match self {
            Decision::Approve => LoanStatus::Approved,
            Decision::Reject => LoanStatus::Rejected,
        }
    }

    fn operation(&self) -> Operation {
        match self {
            Decision::Approve => Operation::ApproveLoan,
            Decision::Reject => Operation::RejectLoan,
        }
    }

    fn message(&self, applicant_name: &str, support_phone: &str) -> Message {
        match self {
            Decision::Approve => templates::loan_approved(applicant_name, support_phone),
            Decision::Reject => templates::loan_rejected(applicant_name, support_phone),
        }
    }
}

/// Tunables for the lifecycle service
#[derive(Debug, Clone)]
pub struct LoanServiceConfig {
    pub support_phone: String,
    pub notify_timeout: Duration,
    /// Accept approve/reject on records that are already terminal.
    pub allow_retransition: bool,
}

/// Loan service for managing the application lifecycle
#[derive(Clone)]
pub struct LoanService {
    loans: Arc<dyn LoanStore>,
    users: Arc<dyn UserStore>,
    notifier: Arc<dyn Notifier>,
    config: LoanServiceConfig,
}

impl LoanService {
    /// Create a new loan service instance
    pub fn new(
        loans: Arc<dyn LoanStore>,
        users: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
        config: LoanServiceConfig,
    ) -> Self {
        Self {
            loans,
            users,
            notifier,
            config,
        }
    }

    /// Validate and persist a new application owned by the caller
    pub async fn submit(
        &self,
        caller: &Caller,
        request: &SubmitLoanRequest,
    ) -> Result<LoanApplication, LoanError> {
        authorize(caller, Operation::SubmitLoan)?;
        let new_loan = request.validate(caller.user_id)?;

        let loan = self.loans.insert(new_loan).await?;

        tracing::info!(
            loan_id = %loan.id,
            applicant_id = %loan.applicant_id,
            amount = loan.amount,
            category = loan.category.display_name(),
            "Loan application submitted"
        );

        Ok(loan)
    }

    /// List every application with its applicant's contact details
    pub async fn list_all(&self, caller: &Caller) -> Result<Vec<LoanWithApplicant>, LoanError> {
        authorize(caller, Operation::ListLoans)?;

        let loans = self.loans.list_all().await?;

        let mut applicant_ids: Vec<Uuid> = loans.iter().map(|l| l.applicant_id).collect();
        applicant_ids.sort();
        applicant_ids.dedup();

        let applicants: HashMap<Uuid, ApplicantSummary> = self
            .users
            .find_by_ids(&applicant_ids)
            .await?
            .iter()
            .map(|user| (user.id, ApplicantSummary::from(user)))
            .collect();

        Ok(loans
            .into_iter()
            .map(|loan| {
                let applicant = applicants.get(&loan.applicant_id).cloned();
                LoanWithApplicant { loan, applicant }
            })
            .collect())
    }

    pub async fn approve(&self, caller: &Caller, id: Uuid) -> Result<LoanApplication, LoanError> {
        self.decide(caller, id, Decision::Approve).await
    }

    pub async fn reject(&self, caller: &Caller, id: Uuid) -> Result<LoanApplication, LoanError> {
        self.decide(caller, id, Decision::Reject).await
    }

    /// Apply an administrator decision and notify the applicant.
    ///
    /// The status write is committed before the applicant lookup and the
    /// notification; an error from either is returned to the caller but the
    /// new status stays in place.
    pub async fn decide(
        &self,
        caller: &Caller,
        id: Uuid,
        decision: Decision,
    ) -> Result<LoanApplication, LoanError> {
        authorize(caller, decision.operation())?;

        let to = decision.target_status();
        let sources = LoanStatus::sources_for(to, self.config.allow_retransition);

        let loan = match self.loans.update_status(id, &sources, to).await? {
            StatusUpdate::Updated(loan) => loan,
            StatusUpdate::NotFound => return Err(LoanError::NotFound(id)),
            StatusUpdate::Rejected(from) => {
                tracing::warn!(
                    loan_id = %id,
                    from = %from,
                    to = %to,
                    terminal = from.is_terminal(),
                    "Illegal status transition refused"
                );
                return Err(LoanError::InvalidTransition { id, from, to });
            }
        };

        tracing::info!(
            loan_id = %loan.id,
            status = %loan.status,
            admin_id = %caller.user_id,
            "Loan status updated"
        );

        let applicant = match self.users.find_by_id(loan.applicant_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::error!(
                    loan_id = %loan.id,
                    applicant_id = %loan.applicant_id,
                    status = %loan.status,
                    "Status committed but applicant account is missing"
                );
                return Err(LoanError::ApplicantNotFound {
                    loan_id: loan.id,
                    applicant_id: loan.applicant_id,
                });
            }
            Err(e) => {
                tracing::error!(loan_id = %loan.id, error = %e, "Status committed but applicant lookup failed");
                return Err(e.into());
            }
        };

        let notification = Notification {
            to: applicant.email.clone(),
            message: decision.message(&applicant.name, &self.config.support_phone),
        };

        if let Err(e) =
            send_bounded(self.notifier.as_ref(), &notification, self.config.notify_timeout).await
        {
            tracing::error!(
                loan_id = %loan.id,
                status = %loan.status,
                to = %notification.to,
                error = %e,
                "Status committed but applicant notification failed"
            );
            return Err(e.into());
        }

        Ok(loan)
    }

    /// Irreversibly remove an application
    pub async fn delete(&self, caller: &Caller, id: Uuid) -> Result<(), LoanError> {
        authorize(caller, Operation::DeleteLoan)?;

        if !self.loans.delete(id).await? {
            return Err(LoanError::NotFound(id));
        }

        tracing::info!(loan_id = %id, admin_id = %caller.user_id, "Loan deleted");
        Ok(())
    }

    /// Check that the loan store is reachable
    pub async fn store_health(&self) -> Result<(), StoreError> {
        self.loans.ping().await
    }
}
