//! Lifecycle tests for the loan service over the in-process stores

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use uuid::Uuid;

    use loandesk_server::loan::{
        LoanApplication, LoanCategory, LoanStatus, NewLoanApplication, SubmitLoanRequest,
    };
    use loandesk_server::loan_service::{LoanError, LoanService, LoanServiceConfig};
    use loandesk_server::models::{User, UserRole};
    use loandesk_server::notify::{MessageBody, Notification, Notifier, NotifyError};
    use loandesk_server::policy::Caller;
    use loandesk_server::store::{
        InMemoryLoanStore, InMemoryUserStore, LoanStore, StatusUpdate, StoreError,
    };

    /// Notifier that keeps every message it is handed
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
            Err(NotifyError::Rejected(550))
        }
    }

    struct SlowNotifier;

    #[async_trait]
    impl Notifier for SlowNotifier {
        async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    /// Loan store wrapper that counts every call reaching it
    struct CountingLoanStore {
        inner: InMemoryLoanStore,
        calls: AtomicUsize,
    }

    impl CountingLoanStore {
        fn new() -> Self {
            Self {
                inner: InMemoryLoanStore::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn touch(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl LoanStore for CountingLoanStore {
        async fn insert(&self, loan: NewLoanApplication) -> Result<LoanApplication, StoreError> {
            self.touch();
            self.inner.insert(loan).await
        }

        async fn list_all(&self) -> Result<Vec<LoanApplication>, StoreError> {
            self.touch();
            self.inner.list_all().await
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<LoanApplication>, StoreError> {
            self.touch();
            self.inner.find_by_id(id).await
        }

        async fn update_status(
            &self,
            id: Uuid,
            from: &[LoanStatus],
            to: LoanStatus,
        ) -> Result<StatusUpdate, StoreError> {
            self.touch();
            self.inner.update_status(id, from, to).await
        }

        async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
            self.touch();
            self.inner.delete(id).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            self.inner.ping().await
        }
    }

    struct Harness {
        service: LoanService,
        loans: Arc<InMemoryLoanStore>,
        users: Arc<InMemoryUserStore>,
        applicant: User,
        admin: User,
    }

    impl Harness {
        fn applicant_caller(&self) -> Caller {
            Caller::new(self.applicant.id, UserRole::User)
        }

        fn admin_caller(&self) -> Caller {
            Caller::new(self.admin.id, UserRole::Admin)
        }

        async fn submit(&self) -> LoanApplication {
            self.service
                .submit(&self.applicant_caller(), &loan_request())
                .await
                .expect("submission should succeed")
        }

        async fn stored_status(&self, id: Uuid) -> Option<LoanStatus> {
            self.loans
                .find_by_id(id)
                .await
                .unwrap()
                .map(|loan| loan.status)
        }
    }

    fn service_config(allow_retransition: bool) -> LoanServiceConfig {
        LoanServiceConfig {
            support_phone: "9876543210".to_string(),
            notify_timeout: Duration::from_millis(200),
            allow_retransition,
        }
    }

    async fn harness_with(notifier: Arc<dyn Notifier>, allow_retransition: bool) -> Harness {
        let loans = Arc::new(InMemoryLoanStore::new());
        let users = Arc::new(InMemoryUserStore::new());
        let applicant = users
            .add_user("Asha", "asha@example.com", Some("9123456780"), UserRole::User)
            .await;
        let admin = users
            .add_user("Ravi", "ravi@example.com", None, UserRole::Admin)
            .await;

        let service = LoanService::new(
            loans.clone(),
            users.clone(),
            notifier,
            service_config(allow_retransition),
        );

        Harness {
            service,
            loans,
            users,
            applicant,
            admin,
        }
    }

    fn loan_request() -> SubmitLoanRequest {
        SubmitLoanRequest {
            name: Some("Asha Traders".to_string()),
            business_type: Some("Retail".to_string()),
            phone: Some("9123456780".to_string()),
            pincode: Some("560001".to_string()),
            address: Some("12 MG Road, Bengaluru".to_string()),
            category: Some("SecuredLoan".to_string()),
            amount: Some(json!(500_000)),
        }
    }

    fn html_of(notification: &Notification) -> &str {
        match &notification.message.body {
            MessageBody::Html(html) => html,
            MessageBody::Text(text) => text,
        }
    }

    #[tokio::test]
    async fn test_submitted_loan_starts_pending_and_is_owned_by_caller() {
        let h = harness_with(Arc::new(RecordingNotifier::default()), false).await;

        let loan = h.submit().await;

        assert_eq!(loan.status, LoanStatus::Pending);
        assert_eq!(loan.applicant_id, h.applicant.id);
        assert_eq!(loan.category, LoanCategory::SecuredLoan);
        assert_eq!(loan.amount, 500_000);
        assert_eq!(h.loans.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_submission_persists_nothing() {
        let h = harness_with(Arc::new(RecordingNotifier::default()), false).await;

        let mut request = loan_request();
        request.amount = Some(json!(1_000_001));
        let result = h.service.submit(&h.applicant_caller(), &request).await;
        assert!(matches!(result, Err(LoanError::AmountExceeded(ref raw)) if raw == "1000001"));

        let mut request = loan_request();
        request.address = Some("   ".to_string());
        let result = h.service.submit(&h.applicant_caller(), &request).await;
        assert!(matches!(result, Err(LoanError::MissingField(ref f)) if f == &vec!["address"]));

        let mut request = loan_request();
        request.category = Some("GoldLoan".to_string());
        let result = h.service.submit(&h.applicant_caller(), &request).await;
        assert!(matches!(result, Err(LoanError::InvalidCategory(_))));

        assert!(h.loans.is_empty().await);
    }

    #[tokio::test]
    async fn test_amount_at_cap_is_accepted() {
        let h = harness_with(Arc::new(RecordingNotifier::default()), false).await;

        let mut request = loan_request();
        request.amount = Some(json!(1_000_000));
        let loan = h.service.submit(&h.applicant_caller(), &request).await.unwrap();

        assert_eq!(loan.amount, 1_000_000);
    }

    #[tokio::test]
    async fn test_admin_cannot_submit() {
        let h = harness_with(Arc::new(RecordingNotifier::default()), false).await;

        let result = h.service.submit(&h.admin_caller(), &loan_request()).await;

        assert!(matches!(result, Err(LoanError::Forbidden(_))));
        assert!(h.loans.is_empty().await);
    }

    #[tokio::test]
    async fn test_forbidden_callers_never_reach_the_store() {
        let loans = Arc::new(CountingLoanStore::new());
        let users = Arc::new(InMemoryUserStore::new());
        let service = LoanService::new(
            loans.clone(),
            users,
            Arc::new(RecordingNotifier::default()),
            service_config(false),
        );
        let applicant = Caller::new(Uuid::new_v4(), UserRole::User);
        let admin = Caller::new(Uuid::new_v4(), UserRole::Admin);
        let id = Uuid::new_v4();

        assert!(matches!(service.list_all(&applicant).await, Err(LoanError::Forbidden(_))));
        assert!(matches!(service.approve(&applicant, id).await, Err(LoanError::Forbidden(_))));
        assert!(matches!(service.reject(&applicant, id).await, Err(LoanError::Forbidden(_))));
        assert!(matches!(service.delete(&applicant, id).await, Err(LoanError::Forbidden(_))));
        assert!(matches!(
            service.submit(&admin, &loan_request()).await,
            Err(LoanError::Forbidden(_))
        ));

        assert_eq!(loans.calls(), 0);
    }

    #[tokio::test]
    async fn test_approve_persists_and_emails_applicant() {
        let notifier = Arc::new(RecordingNotifier::default());
        let h = harness_with(notifier.clone(), false).await;
        let loan = h.submit().await;

        let approved = h.service.approve(&h.admin_caller(), loan.id).await.unwrap();

        assert_eq!(approved.status, LoanStatus::Approved);
        assert_eq!(h.stored_status(loan.id).await, Some(LoanStatus::Approved));

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "asha@example.com");
        assert_eq!(sent[0].message.subject, "Loan Approval");
        assert!(html_of(&sent[0]).contains("Asha"));
        assert!(html_of(&sent[0]).contains("9876543210"));
    }

    #[tokio::test]
    async fn test_reject_persists_and_emails_applicant() {
        let notifier = Arc::new(RecordingNotifier::default());
        let h = harness_with(notifier.clone(), false).await;
        let loan = h.submit().await;

        let rejected = h.service.reject(&h.admin_caller(), loan.id).await.unwrap();

        assert_eq!(rejected.status, LoanStatus::Rejected);
        assert_eq!(h.stored_status(loan.id).await, Some(LoanStatus::Rejected));

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message.subject, "Loan Rejection Notice");
    }

    #[tokio::test]
    async fn test_terminal_status_refuses_second_decision() {
        let notifier = Arc::new(RecordingNotifier::default());
        let h = harness_with(notifier.clone(), false).await;
        let loan = h.submit().await;
        h.service.approve(&h.admin_caller(), loan.id).await.unwrap();

        let again = h.service.approve(&h.admin_caller(), loan.id).await;
        assert!(matches!(
            again,
            Err(LoanError::InvalidTransition {
                from: LoanStatus::Approved,
                to: LoanStatus::Approved,
                ..
            })
        ));

        let flip = h.service.reject(&h.admin_caller(), loan.id).await;
        assert!(matches!(
            flip,
            Err(LoanError::InvalidTransition {
                from: LoanStatus::Approved,
                to: LoanStatus::Rejected,
                ..
            })
        ));

        assert_eq!(h.stored_status(loan.id).await, Some(LoanStatus::Approved));
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_permissive_mode_overwrites_terminal_status() {
        let notifier = Arc::new(RecordingNotifier::default());
        let h = harness_with(notifier.clone(), true).await;
        let loan = h.submit().await;

        h.service.approve(&h.admin_caller(), loan.id).await.unwrap();
        let flipped = h.service.reject(&h.admin_caller(), loan.id).await.unwrap();

        assert_eq!(flipped.status, LoanStatus::Rejected);
        assert_eq!(h.stored_status(loan.id).await, Some(LoanStatus::Rejected));
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found_without_email() {
        let notifier = Arc::new(RecordingNotifier::default());
        let h = harness_with(notifier.clone(), false).await;
        let missing = Uuid::new_v4();

        assert!(matches!(
            h.service.approve(&h.admin_caller(), missing).await,
            Err(LoanError::NotFound(id)) if id == missing
        ));
        assert!(matches!(
            h.service.reject(&h.admin_caller(), missing).await,
            Err(LoanError::NotFound(_))
        ));
        assert!(matches!(
            h.service.delete(&h.admin_caller(), missing).await,
            Err(LoanError::NotFound(_))
        ));

        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_notifier_failure_keeps_committed_status() {
        let h = harness_with(Arc::new(FailingNotifier), false).await;
        let loan = h.submit().await;

        let result = h.service.approve(&h.admin_caller(), loan.id).await;

        assert!(matches!(
            result,
            Err(LoanError::Notification(NotifyError::Rejected(550)))
        ));
        assert_eq!(h.stored_status(loan.id).await, Some(LoanStatus::Approved));
    }

    #[tokio::test]
    async fn test_slow_notifier_is_cut_off_and_status_kept() {
        let h = harness_with(Arc::new(SlowNotifier), false).await;
        let loan = h.submit().await;

        let result = h.service.reject(&h.admin_caller(), loan.id).await;

        assert!(matches!(
            result,
            Err(LoanError::Notification(NotifyError::Timeout(_)))
        ));
        assert_eq!(h.stored_status(loan.id).await, Some(LoanStatus::Rejected));
    }

    #[tokio::test]
    async fn test_missing_applicant_after_commit() {
        let notifier = Arc::new(RecordingNotifier::default());
        let h = harness_with(notifier.clone(), false).await;
        let loan = h.submit().await;
        h.users.remove_user(h.applicant.id).await;

        let result = h.service.approve(&h.admin_caller(), loan.id).await;

        assert!(matches!(
            result,
            Err(LoanError::ApplicantNotFound { applicant_id, .. }) if applicant_id == h.applicant.id
        ));
        assert_eq!(h.stored_status(loan.id).await, Some(LoanStatus::Approved));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_list_all_includes_applicant_details_in_submission_order() {
        let h = harness_with(Arc::new(RecordingNotifier::default()), false).await;
        let first = h.submit().await;
        let second = h.submit().await;

        let listed = h.service.list_all(&h.admin_caller()).await.unwrap();

        let ids: Vec<Uuid> = listed.iter().map(|entry| entry.loan.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);

        let applicant = listed[0].applicant.as_ref().expect("applicant details");
        assert_eq!(applicant.name, "Asha");
        assert_eq!(applicant.email, "asha@example.com");
        assert_eq!(applicant.phone.as_deref(), Some("9123456780"));
    }

    #[tokio::test]
    async fn test_list_all_tolerates_deleted_applicant() {
        let h = harness_with(Arc::new(RecordingNotifier::default()), false).await;
        h.submit().await;
        h.users.remove_user(h.applicant.id).await;

        let listed = h.service.list_all(&h.admin_caller()).await.unwrap();

        assert_eq!(listed.len(), 1);
        assert!(listed[0].applicant.is_none());
    }

    #[tokio::test]
    async fn test_end_to_end_submit_review_delete() {
        let notifier = Arc::new(RecordingNotifier::default());
        let h = harness_with(notifier.clone(), false).await;
        let admin = h.admin_caller();

        let loan = h.submit().await;
        assert_eq!(h.service.list_all(&admin).await.unwrap().len(), 1);

        h.service.approve(&admin, loan.id).await.unwrap();
        let listed = h.service.list_all(&admin).await.unwrap();
        assert_eq!(listed[0].loan.status, LoanStatus::Approved);
        assert_eq!(notifier.sent().len(), 1);

        h.service.delete(&admin, loan.id).await.unwrap();
        assert!(h.service.list_all(&admin).await.unwrap().is_empty());

        assert!(matches!(
            h.service.delete(&admin, loan.id).await,
            Err(LoanError::NotFound(_))
        ));
        assert!(matches!(
            h.service.approve(&admin, loan.id).await,
            Err(LoanError::NotFound(_))
        ));
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_decisions_commit_exactly_once() {
        let notifier = Arc::new(RecordingNotifier::default());
        let h = harness_with(notifier.clone(), false).await;
        let loan = h.submit().await;
        let admin = h.admin_caller();

        let (approve, reject) = tokio::join!(
            h.service.approve(&admin, loan.id),
            h.service.reject(&admin, loan.id)
        );

        let winners = [approve.is_ok(), reject.is_ok()]
            .iter()
            .filter(|ok| **ok)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(notifier.sent().len(), 1);
    }
}
