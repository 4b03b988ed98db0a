use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{LoanStore, StatusUpdate, StoreError, UserStore};
use crate::loan::{LoanApplication, LoanStatus, NewLoanApplication};
use crate::models::{User, UserRole};

/// Process-local loan store. Records are kept in insertion order.
#[derive(Default)]
pub struct InMemoryLoanStore {
    loans: RwLock<Vec<LoanApplication>>,
}

impl InMemoryLoanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.loans.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.loans.read().await.is_empty()
    }
}

#[async_trait]
impl LoanStore for InMemoryLoanStore {
    async fn insert(&self, loan: NewLoanApplication) -> Result<LoanApplication, StoreError> {
        let now = Utc::now();
        let record = LoanApplication {
            id: Uuid::new_v4(),
            applicant_id: loan.applicant_id,
            applicant_name: loan.applicant_name,
            business_type: loan.business_type,
            phone: loan.phone,
            pincode: loan.pincode,
            address: loan.address,
            category: loan.category,
            amount: loan.amount,
            status: LoanStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.loans.write().await.push(record.clone());
        Ok(record)
    }

    async fn list_all(&self) -> Result<Vec<LoanApplication>, StoreError> {
        Ok(self.loans.read().await.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LoanApplication>, StoreError> {
        Ok(self.loans.read().await.iter().find(|l| l.id == id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: &[LoanStatus],
        to: LoanStatus,
    ) -> Result<StatusUpdate, StoreError> {
        let mut loans = self.loans.write().await;
        let Some(loan) = loans.iter_mut().find(|l| l.id == id) else {
            return Ok(StatusUpdate::NotFound);
        };

        if !from.contains(&loan.status) {
            return Ok(StatusUpdate::Rejected(loan.status));
        }

        loan.status = to;
        loan.updated_at = Utc::now();
        Ok(StatusUpdate::Updated(loan.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut loans = self.loans.write().await;
        let before = loans.len();
        loans.retain(|l| l.id != id);
        Ok(loans.len() < before)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Process-local account store
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account and return it.
    pub async fn add_user(
        &self,
        name: &str,
        email: &str,
        phone: Option<&str>,
        role: UserRole,
    ) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.map(str::to_string),
            role,
            approved: false,
            created_at: now,
            updated_at: now,
        };
        self.users.write().await.push(user.clone());
        user
    }

    pub async fn remove_user(&self, id: Uuid) {
        self.users.write().await.retain(|u| u.id != id);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn set_approved(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
            user.approved = true;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}
