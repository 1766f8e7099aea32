//! Adjustment ledger.
//!
//! Reads approved manual adjustments and salary raises for an employee and
//! salary month. The approval workflow itself lives outside the engine; the
//! ledger only decides which records count:
//!
//! - Adjustments: every APPROVED record for the month contributes its signed
//!   amount.
//! - Raises: the APPROVED raise for the month with the highest id wins.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::error::EngineResult;
use crate::models::{EmployeeId, PayrollAdjustment, PayrollRaise, SalaryMonth};
use crate::store::ApprovalStore;

/// Sums the signed amounts of the adjustments that apply to the employee
/// and month.
///
/// # Examples
///
/// ```
/// use payroll_engine::ledger::sum_net_adjustment;
/// use payroll_engine::models::{AdjustmentSign, ApprovalStatus, PayrollAdjustment, SalaryMonth};
/// use rust_decimal::Decimal;
///
/// let month: SalaryMonth = "2026-01".parse().unwrap();
/// let make = |id, sign, amount: i64, status| PayrollAdjustment {
///     id,
///     employee_id: 1,
///     sign,
///     amount: Decimal::from(amount),
///     reason: String::new(),
///     effective_month: month,
///     status,
/// };
///
/// let records = vec![
///     make(1, AdjustmentSign::Plus, 100_000, ApprovalStatus::Approved),
///     make(2, AdjustmentSign::Minus, 150_000, ApprovalStatus::Approved),
///     make(3, AdjustmentSign::Plus, 999_999, ApprovalStatus::Pending),
/// ];
///
/// assert_eq!(sum_net_adjustment(&records, 1, month), Decimal::from(-50_000));
/// ```
pub fn sum_net_adjustment(
    adjustments: &[PayrollAdjustment],
    employee_id: EmployeeId,
    salary_month: SalaryMonth,
) -> Decimal {
    adjustments
        .iter()
        .filter(|a| a.applies_to(employee_id, salary_month))
        .map(PayrollAdjustment::signed_amount)
        .sum()
}

/// Picks the raise that applies to the employee and month: among approved
/// matches, the one with the highest id.
pub fn select_active_raise(
    raises: &[PayrollRaise],
    employee_id: EmployeeId,
    salary_month: SalaryMonth,
) -> Option<&PayrollRaise> {
    raises
        .iter()
        .filter(|r| r.applies_to(employee_id, salary_month))
        .max_by_key(|r| r.id)
}

/// Read-only view over an [`ApprovalStore`].
#[derive(Clone)]
pub struct AdjustmentLedger {
    store: Arc<dyn ApprovalStore>,
}

impl AdjustmentLedger {
    /// Creates a ledger over the given approval store.
    pub fn new(store: Arc<dyn ApprovalStore>) -> Self {
        Self { store }
    }

    /// Net of approved adjustments for the employee and month, zero if none.
    pub async fn net_adjustment(
        &self,
        employee_id: EmployeeId,
        salary_month: SalaryMonth,
    ) -> EngineResult<Decimal> {
        let adjustments = self.store.adjustments(employee_id, salary_month).await?;
        Ok(sum_net_adjustment(&adjustments, employee_id, salary_month))
    }

    /// The approved raise in effect for the employee and month, if any.
    pub async fn active_raise(
        &self,
        employee_id: EmployeeId,
        salary_month: SalaryMonth,
    ) -> EngineResult<Option<PayrollRaise>> {
        let raises = self.store.raises(employee_id, salary_month).await?;
        Ok(select_active_raise(&raises, employee_id, salary_month).cloned())
    }
}

impl std::fmt::Debug for AdjustmentLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdjustmentLedger").finish_non_exhaustive()
    }
}
