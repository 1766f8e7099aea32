//! Approved pay adjustments and salary raises.
//!
//! Both records are produced by an external approval workflow. The engine
//! only reads them, and only APPROVED records for the matching effective
//! month count towards a calculation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{EmployeeId, SalaryMonth};

/// Identifier of a manual pay adjustment.
pub type AdjustmentId = u64;

/// Identifier of a salary raise record.
pub type RaiseId = u64;

/// Direction of a manual adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdjustmentSign {
    /// Adds to pay.
    #[serde(rename = "+")]
    Plus,
    /// Subtracts from pay.
    #[serde(rename = "-")]
    Minus,
}

impl AdjustmentSign {
    /// Applies the sign to a magnitude.
    ///
    /// ```
    /// use payroll_engine::models::AdjustmentSign;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(AdjustmentSign::Minus.apply(Decimal::from(500)), Decimal::from(-500));
    /// ```
    pub fn apply(self, amount: Decimal) -> Decimal {
        match self {
            AdjustmentSign::Plus => amount,
            AdjustmentSign::Minus => -amount,
        }
    }
}

/// Outcome of the approval workflow for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    /// Awaiting approval.
    Pending,
    /// Approved; eligible for payroll.
    Approved,
    /// Rejected; never applied.
    Rejected,
}

/// A manually approved one-off change to an employee's pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollAdjustment {
    /// Record identifier.
    pub id: AdjustmentId,
    /// The employee the adjustment applies to.
    pub employee_id: EmployeeId,
    /// Whether the amount is added or subtracted.
    pub sign: AdjustmentSign,
    /// Non-negative magnitude.
    pub amount: Decimal,
    /// Free-text justification.
    pub reason: String,
    /// The salary month the adjustment lands in.
    pub effective_month: SalaryMonth,
    /// Approval state.
    pub status: ApprovalStatus,
}

impl PayrollAdjustment {
    /// The amount with its sign applied.
    pub fn signed_amount(&self) -> Decimal {
        self.sign.apply(self.amount)
    }

    /// True if this record counts for the employee and month.
    pub fn applies_to(&self, employee_id: EmployeeId, month: SalaryMonth) -> bool {
        self.employee_id == employee_id
            && self.effective_month == month
            && self.status == ApprovalStatus::Approved
    }
}

/// An approved change to an employee's base salary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRaise {
    /// Record identifier. Higher ids were created later.
    pub id: RaiseId,
    /// The employee receiving the raise.
    pub employee_id: EmployeeId,
    /// Base salary before the raise.
    pub before_salary: Decimal,
    /// Base salary after the raise.
    pub after_salary: Decimal,
    /// Raise percentage, if recorded.
    pub raise_percent: Option<Decimal>,
    /// Free-text justification.
    #[serde(default)]
    pub reason: String,
    /// The first salary month the raise applies to.
    pub effective_month: SalaryMonth,
    /// Approval state.
    pub status: ApprovalStatus,
}

impl PayrollRaise {
    /// True if this record counts for the employee and month.
    pub fn applies_to(&self, employee_id: EmployeeId, month: SalaryMonth) -> bool {
        self.employee_id == employee_id
            && self.effective_month == month
            && self.status == ApprovalStatus::Approved
    }
}
