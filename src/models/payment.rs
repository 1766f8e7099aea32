//! Payment history emitted when a batch is paid.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BatchId, EmployeeId, ResultId};

/// Identifier of a payment history record.
pub type PaymentId = u64;

/// How the payment was made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Transfer to the employee's registered account.
    #[default]
    BankTransfer,
}

/// Record that an employee result has been paid. There is at most one per
/// result; downstream payslip and reporting consumers read these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentHistory {
    /// Record identifier.
    pub id: PaymentId,
    /// The employee result that was paid.
    pub payroll_result_id: ResultId,
    /// The batch the result belongs to.
    pub batch_id: BatchId,
    /// The employee paid.
    pub employee_id: EmployeeId,
    /// Amount paid (the result's net pay).
    pub amount: Decimal,
    /// Payment channel.
    pub method: PaymentMethod,
    /// When the payment was recorded.
    pub paid_at: DateTime<Utc>,
}
