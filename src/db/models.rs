use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Direction of a transaction, derived from the sign of the statement amount
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Direction {
    Debit,  // money leaving the account (negative amount)
    Credit, // money arriving (zero or positive amount)
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Debit => "debit",
            Direction::Credit => "credit",
        }
    }

    /// Classify a signed statement amount. Zero counts as a credit.
    pub fn from_signed_amount(amount: Decimal) -> Self {
        if amount < Decimal::ZERO {
            Direction::Debit
        } else {
            Direction::Credit
        }
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debit" => Ok(Direction::Debit),
            "credit" => Ok(Direction::Credit),
            _ => Err(()),
        }
    }
}

/// Stored transaction (amount is always the unsigned magnitude)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Option<i64>,
    pub booking_date: NaiveDate,
    pub value_date: NaiveDate,
    pub amount: Decimal,
    pub direction: Direction,
    pub import_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A named non-schema column (payee, purpose text, IBAN, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionDetailType {
    pub id: Option<i64>,
    pub label: String,
    pub description: String,
}

/// Value of one detail column for one transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionDetail {
    pub id: Option<i64>,
    pub transaction_id: i64,
    pub transaction_detail_type_id: i64,
    pub description: String,
}

/// One recorded run of `import`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub id: Option<i64>,
    pub filename: String,
    pub checksum: String,
    pub rows_read: i64,
    pub rows_inserted: i64,
    pub duplicates: i64,
    pub imported_at: DateTime<Utc>,
}
