//! Per-employee payroll result models.
//!
//! This module contains the [`EmployeeCalculation`] produced by the
//! calculation engine and the stored [`PayrollEmployeeResult`] that wraps it
//! with batch identity. Results carry their pay line items and the audit
//! trace of every calculation decision.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BatchId, EmployeeId, SalaryMonth};

/// Identifier of a stored employee result.
pub type ResultId = u64;

/// Outcome of one employee's calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculationStatus {
    /// Figures are complete and payable.
    Success,
    /// Figures are missing or need manual review.
    Failed,
}

/// Which side of the payslip an item sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayItemKind {
    /// Adds to gross pay.
    Allowance,
    /// Withheld from gross pay.
    Deduction,
}

/// A single payslip line.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{PayItem, PayItemKind};
/// use rust_decimal::Decimal;
///
/// let item = PayItem {
///     kind: PayItemKind::Allowance,
///     code: "OVERTIME".to_string(),
///     name: "Overtime pay".to_string(),
///     amount: Decimal::from(80_000),
///     taxable: true,
/// };
/// assert_eq!(item.amount, Decimal::from(80_000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayItem {
    /// Allowance or deduction.
    pub kind: PayItemKind,
    /// Component code (master code, `OVERTIME` or `ADJUSTMENT`).
    pub code: String,
    /// Display name.
    pub name: String,
    /// Non-negative amount.
    pub amount: Decimal,
    /// Whether the item is taxable income.
    pub taxable: bool,
}

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// The figures computed for one employee and month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeCalculation {
    /// The employee.
    pub employee_id: EmployeeId,
    /// The month calculated.
    pub salary_month: SalaryMonth,
    /// Effective base salary (raise applied).
    pub base_salary: Decimal,
    /// Sum of allowances.
    pub total_allowances: Decimal,
    /// Sum of deductions including negative adjustments.
    pub total_deductions: Decimal,
    /// Attendance-derived overtime pay.
    pub overtime_pay: Decimal,
    /// Signed net of approved manual adjustments.
    pub adjustment_net: Decimal,
    /// Pay before deductions.
    pub gross_pay: Decimal,
    /// Pay after deductions, never negative.
    pub net_pay: Decimal,
    /// Success or failure.
    pub status: CalculationStatus,
    /// Why the calculation failed.
    pub failure_reason: Option<String>,
    /// Payslip lines.
    pub items: Vec<PayItem>,
    /// Steps taken to reach these figures.
    pub audit_trace: Vec<AuditStep>,
}

impl EmployeeCalculation {
    /// A failed calculation with zeroed figures.
    pub fn failed(
        employee_id: EmployeeId,
        salary_month: SalaryMonth,
        reason: impl Into<String>,
        audit_trace: Vec<AuditStep>,
    ) -> Self {
        Self {
            employee_id,
            salary_month,
            base_salary: Decimal::ZERO,
            total_allowances: Decimal::ZERO,
            total_deductions: Decimal::ZERO,
            overtime_pay: Decimal::ZERO,
            adjustment_net: Decimal::ZERO,
            gross_pay: Decimal::ZERO,
            net_pay: Decimal::ZERO,
            status: CalculationStatus::Failed,
            failure_reason: Some(reason.into()),
            items: Vec::new(),
            audit_trace,
        }
    }

    /// True when the figures are payable.
    pub fn is_success(&self) -> bool {
        self.status == CalculationStatus::Success
    }
}

/// A stored employee result, owned by one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollEmployeeResult {
    /// Result identifier, stable across recalculation.
    pub id: ResultId,
    /// The owning batch.
    pub batch_id: BatchId,
    /// When the figures were last calculated.
    pub calculated_at: DateTime<Utc>,
    /// The calculated figures.
    #[serde(flatten)]
    pub calculation: EmployeeCalculation,
}

impl PayrollEmployeeResult {
    /// The employee this result is for.
    pub fn employee_id(&self) -> EmployeeId {
        self.calculation.employee_id
    }

    /// True when the result is payable.
    pub fn is_success(&self) -> bool {
        self.calculation.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn month() -> SalaryMonth {
        SalaryMonth::from_str("2026-01").unwrap()
    }

    #[test]
    fn test_failed_calculation_zeroes_figures() {
        let calc = EmployeeCalculation::failed(5, month(), "attendance missing", vec![]);
        assert_eq!(calc.status, CalculationStatus::Failed);
        assert_eq!(calc.failure_reason.as_deref(), Some("attendance missing"));
        assert_eq!(calc.gross_pay, Decimal::ZERO);
        assert_eq!(calc.net_pay, Decimal::ZERO);
        assert!(!calc.is_success());
    }

    #[test]
    fn test_result_serializes_flat() {
        let mut calc = EmployeeCalculation::failed(5, month(), "x", vec![]);
        calc.status = CalculationStatus::Success;
        calc.failure_reason = None;
        calc.net_pay = dec("3380000");

        let result = PayrollEmployeeResult {
            id: 11,
            batch_id: 2,
            calculated_at: Utc::now(),
            calculation: calc,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["id"], 11);
        assert_eq!(json["batch_id"], 2);
        assert_eq!(json["employee_id"], 5);
        assert_eq!(json["salary_month"], "2026-01");
        assert_eq!(json["status"], "SUCCESS");
        assert_eq!(json["net_pay"], "3380000");
        assert!(json["failure_reason"].is_null());
        assert!(result.is_success());
        assert_eq!(result.employee_id(), 5);
    }

    #[test]
    fn test_pay_item_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&PayItemKind::Deduction).unwrap(),
            "\"DEDUCTION\""
        );
    }
}
