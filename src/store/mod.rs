//! Persistence seams for loans and accounts
//!
//! The lifecycle service only sees these traits. `postgres` is the production
//! backend; `memory` keeps everything in process.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::loan::{LoanApplication, LoanStatus, NewLoanApplication};
use crate::models::User;

pub use memory::{InMemoryLoanStore, InMemoryUserStore};
pub use postgres::{connect, PgLoanStore, PgUserStore};

/// Store failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Schema migration failed: {0}")]
    Migration(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Result of a conditional status write
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    Updated(LoanApplication),
    NotFound,
    /// The record exists but its current status was not an accepted source.
    Rejected(LoanStatus),
}

/// Collection of loan applications keyed by id
#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn insert(&self, loan: NewLoanApplication) -> Result<LoanApplication, StoreError>;

    /// All records, oldest first
    async fn list_all(&self) -> Result<Vec<LoanApplication>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LoanApplication>, StoreError>;

    /// Atomically set `status = to` if the current status is one of `from`.
    async fn update_status(
        &self,
        id: Uuid,
        from: &[LoanStatus],
        to: LoanStatus,
    ) -> Result<StatusUpdate, StoreError>;

    /// Hard delete. Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Identity lookups needed by the lifecycle and account services
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError>;

    /// Mark an account approved, returning it if it exists.
    async fn set_approved(&self, id: Uuid) -> Result<Option<User>, StoreError>;
}
