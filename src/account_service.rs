//! Account approval, kept apart from the loan lifecycle

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::models::User;
use crate::notify::{send_bounded, templates, Notification, Notifier, NotifyError};
use crate::policy::{authorize, Caller, Forbidden, Operation};
use crate::store::{StoreError, UserStore};

#[derive(Error, Debug)]
pub enum AccountError {
    #[error(transparent)]
    Forbidden(#[from] Forbidden),

    #[error("User not found")]
    NotFound(Uuid),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Notification failed: {0}")]
    Notification(#[from] NotifyError),
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    notifier: Arc<dyn Notifier>,
    notify_timeout: Duration,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, notifier: Arc<dyn Notifier>, notify_timeout: Duration) -> Self {
        Self {
            users,
            notifier,
            notify_timeout,
        }
    }

    /// Mark an account approved and tell its owner.
    ///
    /// As with loan decisions, a failed email does not undo the approval.
    pub async fn approve_account(&self, caller: &Caller, user_id: Uuid) -> Result<User, AccountError> {
        authorize(caller, Operation::ApproveAccount)?;

        let user = self
            .users
            .set_approved(user_id)
            .await?
            .ok_or(AccountError::NotFound(user_id))?;

        tracing::info!(user_id = %user.id, admin_id = %caller.user_id, "Account approved");

        let notification = Notification {
            to: user.email.clone(),
            message: templates::account_approved(&user.name),
        };

        if let Err(e) = send_bounded(self.notifier.as_ref(), &notification, self.notify_timeout).await {
            tracing::error!(user_id = %user.id, error = %e, "Account approved but notification failed");
            return Err(e.into());
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::notify::LogNotifier;
    use crate::store::InMemoryUserStore;
    use async_trait::async_trait;

    struct DownNotifier;

    #[async_trait]
    impl Notifier for DownNotifier {
        async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
            Err(NotifyError::Transport("connection refused".to_string()))
        }
    }

    async fn setup(notifier: Arc<dyn Notifier>) -> (AccountService, Arc<InMemoryUserStore>, User) {
        let users = Arc::new(InMemoryUserStore::new());
        let user = users.add_user("Meera", "meera@example.com", None, UserRole::User).await;
        let service = AccountService::new(users.clone(), notifier, Duration::from_secs(1));
        (service, users, user)
    }

    #[tokio::test]
    async fn test_admin_approves_account() {
        let (service, _, user) = setup(Arc::new(LogNotifier)).await;
        let admin = Caller::new(Uuid::new_v4(), UserRole::Admin);

        let approved = service.approve_account(&admin, user.id).await.unwrap();

        assert!(approved.approved);
    }

    #[tokio::test]
    async fn test_applicant_cannot_approve_accounts() {
        let (service, users, user) = setup(Arc::new(LogNotifier)).await;
        let caller = Caller::new(user.id, UserRole::User);

        let result = service.approve_account(&caller, user.id).await;

        assert!(matches!(result, Err(AccountError::Forbidden(_))));
        assert!(!users.find_by_id(user.id).await.unwrap().unwrap().approved);
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let (service, _, _) = setup(Arc::new(LogNotifier)).await;
        let admin = Caller::new(Uuid::new_v4(), UserRole::Admin);

        let result = service.approve_account(&admin, Uuid::new_v4()).await;

        assert!(matches!(result, Err(AccountError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_failed_email_keeps_approval() {
        let (service, users, user) = setup(Arc::new(DownNotifier)).await;
        let admin = Caller::new(Uuid::new_v4(), UserRole::Admin);

        let result = service.approve_account(&admin, user.id).await;

        assert!(matches!(result, Err(AccountError::Notification(_))));
        assert!(users.find_by_id(user.id).await.unwrap().unwrap().approved);
    }
}
