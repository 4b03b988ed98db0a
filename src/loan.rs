//! Loan application models for LoanDesk
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::loan_service::LoanError;
use crate::models::ApplicantSummary;

/// Largest amount a single application may request
pub const MAX_LOAN_AMOUNT: i64 = 1_000_000;

/// Loan status enum
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "loan_status", rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 3] = [LoanStatus::Pending, LoanStatus::Approved, LoanStatus::Rejected];

    /// Approved and Rejected admit no further transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoanStatus::Pending)
    }

    pub fn can_transition_to(&self, to: LoanStatus) -> bool {
        matches!(
            (self, to),
            (LoanStatus::Pending, LoanStatus::Approved) | (LoanStatus::Pending, LoanStatus::Rejected)
        )
    }

    /// Statuses from which a move to `to` is accepted.
    ///
    /// In permissive mode every status qualifies, which reproduces the
    /// unconditional overwrite of earlier deployments.
    pub fn sources_for(to: LoanStatus, permissive: bool) -> Vec<LoanStatus> {
        LoanStatus::ALL
            .into_iter()
            .filter(|from| permissive || from.can_transition_to(to))
            .collect()
    }

    /// Lowercase name matching the `loan_status` database enum
    pub fn as_db_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Approved => "approved",
            LoanStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoanStatus::Pending => "Pending",
            LoanStatus::Approved => "Approved",
            LoanStatus::Rejected => "Rejected",
        };
        f.write_str(s)
    }
}

/// Loan product category
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "loan_category", rename_all = "snake_case")]
pub enum LoanCategory {
    #[serde(alias = "Secured Loan")]
    SecuredLoan,
    #[serde(alias = "Unsecured Loan")]
    UnsecuredLoan,
    #[serde(alias = "Machinery Loan")]
    MachineryLoan,
}

impl LoanCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            LoanCategory::SecuredLoan => "Secured Loan",
            LoanCategory::UnsecuredLoan => "Unsecured Loan",
            LoanCategory::MachineryLoan => "Machinery Loan",
        }
    }
}

impl FromStr for LoanCategory {
    type Err = ();

    /// Accepts both the compact (`SecuredLoan`) and display (`Secured Loan`) forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SecuredLoan" | "Secured Loan" => Ok(LoanCategory::SecuredLoan),
            "UnsecuredLoan" | "Unsecured Loan" => Ok(LoanCategory::UnsecuredLoan),
            "MachineryLoan" | "Machinery Loan" => Ok(LoanCategory::MachineryLoan),
            _ => Err(()),
        }
    }
}

/// Loan application record
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplication {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub applicant_name: String,
    pub business_type: String,
    pub phone: String,
    pub pincode: String,
    pub address: String,
    pub category: LoanCategory,
    pub amount: i64,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new application, ready for the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoanApplication {
    pub applicant_id: Uuid,
    pub applicant_name: String,
    pub business_type: String,
    pub phone: String,
    pub pincode: String,
    pub address: String,
    pub category: LoanCategory,
    pub amount: i64,
}

/// Loan as listed to administrators
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoanWithApplicant {
    #[serde(flatten)]
    pub loan: LoanApplication,
    /// `None` when the owning account no longer exists
    pub applicant: Option<ApplicantSummary>,
}

/// Request body for `POST /api/loans`
///
/// Every field is optional at the wire level so that absence is reported as a
/// validation failure rather than a deserialization error.
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubmitLoanRequest {
    pub name: Option<String>,
    pub business_type: Option<String>,
    pub phone: Option<String>,
    pub pincode: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
    /// Any JSON value; numbers and numeric strings are classified by `validate`.
    pub amount: Option<Value>,
}

impl SubmitLoanRequest {
    /// Validate in order: presence, amount ceiling, category.
    pub fn validate(&self, applicant_id: Uuid) -> Result<NewLoanApplication, LoanError> {
        let text = [
            ("name", &self.name),
            ("businessType", &self.business_type),
            ("phone", &self.phone),
            ("pincode", &self.pincode),
            ("address", &self.address),
            ("category", &self.category),
        ];
        let mut missing: Vec<&'static str> = text
            .iter()
            .filter(|(_, value)| present(value).is_none())
            .map(|(field, _)| *field)
            .collect();
        let amount = AmountInput::read(&self.amount);
        if amount.is_missing() {
            missing.push("amount");
        }
        if !missing.is_empty() {
            return Err(LoanError::MissingField(missing));
        }

        let amount = match amount {
            AmountInput::Number { value, raw } => {
                if value > MAX_LOAN_AMOUNT as f64 {
                    return Err(LoanError::AmountExceeded(raw));
                }
                // stored in whole currency units
                if value < 0.0 || value.fract() != 0.0 {
                    return Err(LoanError::InvalidAmount(raw));
                }
                value as i64
            }
            AmountInput::Invalid(raw) => return Err(LoanError::InvalidAmount(raw)),
            AmountInput::Missing => return Err(LoanError::MissingField(vec!["amount"])),
        };

        let raw_category = present(&self.category).unwrap_or_default();
        let category = raw_category
            .parse::<LoanCategory>()
            .map_err(|_| LoanError::InvalidCategory(raw_category.to_string()))?;

        Ok(NewLoanApplication {
            applicant_id,
            applicant_name: present(&self.name).unwrap_or_default().to_string(),
            business_type: present(&self.business_type).unwrap_or_default().to_string(),
            phone: present(&self.phone).unwrap_or_default().to_string(),
            pincode: present(&self.pincode).unwrap_or_default().to_string(),
            address: present(&self.address).unwrap_or_default().to_string(),
            category,
            amount,
        })
    }
}

/// Wire `amount` sorted into what validation needs to know about it
enum AmountInput {
    Missing,
    Number { value: f64, raw: String },
    Invalid(String),
}

impl AmountInput {
    /// Numeric strings count as numbers; null, blank and zero count as absent.
    fn read(value: &Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => AmountInput::Missing,
            Some(Value::Number(n)) => match n.as_f64() {
                Some(value) => AmountInput::Number {
                    value,
                    raw: n.to_string(),
                },
                None => AmountInput::Invalid(n.to_string()),
            },
            Some(Value::String(s)) => {
                let raw = s.trim();
                if raw.is_empty() {
                    return AmountInput::Missing;
                }
                match raw.parse::<f64>() {
                    Ok(value) if value.is_finite() => AmountInput::Number {
                        value,
                        raw: raw.to_string(),
                    },
                    _ => AmountInput::Invalid(raw.to_string()),
                }
            }
            Some(other) => AmountInput::Invalid(other.to_string()),
        }
    }

    fn is_missing(&self) -> bool {
        match self {
            AmountInput::Missing => true,
            AmountInput::Number { value, .. } => *value == 0.0,
            AmountInput::Invalid(_) => false,
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
