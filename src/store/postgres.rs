use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use uuid::Uuid;

use super::{LoanStore, StatusUpdate, StoreError, UserStore};
use crate::config::Config;
use crate::loan::{LoanApplication, LoanStatus, NewLoanApplication};
use crate::models::User;

/// Open the pool shared by both stores and bring the schema up to date.
pub async fn connect(config: &Config) -> Result<PgPool, StoreError> {
    tracing::info!(
        url = %config.database_url_masked(),
        max_connections = config.db_max_connections,
        "Connecting to loan database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect(&config.database_url)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

    migrate(&pool).await?;

    let (pending,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM loans WHERE status = 'pending'")
            .fetch_one(&pool)
            .await?;
    tracing::info!(pending_loans = pending, "Loan database ready");

    Ok(pool)
}

/// Apply the embedded `migrations/` to `pool`.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Migration(e.to_string()))
}

async fn check_connection(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;
    Ok(())
}

/// PostgreSQL-backed loan store
#[derive(Clone)]
pub struct PgLoanStore {
    db_pool: PgPool,
}

impl PgLoanStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl LoanStore for PgLoanStore {
    async fn insert(&self, loan: NewLoanApplication) -> Result<LoanApplication, StoreError> {
        let now = Utc::now();

        let loan = sqlx::query_as::<_, LoanApplication>(
            r#"
            INSERT INTO loans (
                id, applicant_id, applicant_name, business_type, phone, pincode,
                address, category, amount, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(loan.applicant_id)
        .bind(loan.applicant_name)
        .bind(loan.business_type)
        .bind(loan.phone)
        .bind(loan.pincode)
        .bind(loan.address)
        .bind(loan.category)
        .bind(loan.amount)
        .bind(LoanStatus::Pending)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(loan)
    }

    async fn list_all(&self) -> Result<Vec<LoanApplication>, StoreError> {
        let loans = sqlx::query_as::<_, LoanApplication>(
            "SELECT * FROM loans ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(loans)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LoanApplication>, StoreError> {
        let loan = sqlx::query_as::<_, LoanApplication>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(loan)
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: &[LoanStatus],
        to: LoanStatus,
    ) -> Result<StatusUpdate, StoreError> {
        let sources: Vec<String> = from.iter().map(|s| s.as_db_str().to_string()).collect();

        let updated = sqlx::query_as::<_, LoanApplication>(
            r#"
            UPDATE loans
            SET status = $1, updated_at = $2
            WHERE id = $3 AND status::text = ANY($4)
            RETURNING *
            "#,
        )
        .bind(to)
        .bind(Utc::now())
        .bind(id)
        .bind(&sources[..])
        .fetch_optional(&self.db_pool)
        .await?;

        if let Some(loan) = updated {
            return Ok(StatusUpdate::Updated(loan));
        }

        let current = sqlx::query_as::<_, (LoanStatus,)>("SELECT status FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(match current {
            Some((status,)) => StatusUpdate::Rejected(status),
            None => StatusUpdate::NotFound,
        })
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        check_connection(&self.db_pool).await
    }
}

/// PostgreSQL-backed account lookups
#[derive(Clone)]
pub struct PgUserStore {
    db_pool: PgPool,
}

impl PgUserStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(user)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.db_pool)
            .await?;
        Ok(users)
    }

    async fn set_approved(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET approved = TRUE, updated_at = $1 WHERE id = $2 RETURNING *",
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;
        Ok(user)
    }
}
