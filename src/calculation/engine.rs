//! Per-employee payroll calculation.
//!
//! [`PayrollCalculator`] combines the employee directory, attendance,
//! adjustment ledger and pay component master list into one
//! [`EmployeeCalculation`]. Calculation never fails as a whole: any
//! unresolved dependency becomes a FAILED calculation carrying the reason and
//! the audit steps completed so far.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::base_salary::resolve_base_salary;
use super::overtime::calculate_overtime_pay;
use super::totals::{PayComponents, calculate_totals, gross_before_deductions};
use crate::components::{PayComponentResolver, resolve_allowances, resolve_deductions};
use crate::config::OvertimeConfig;
use crate::error::{EngineError, EngineResult};
use crate::ledger::AdjustmentLedger;
use crate::models::{
    AuditStep, CalculationStatus, EmployeeCalculation, EmployeeId, PayItem, PayItemKind,
    SalaryMonth,
};
use crate::store::{AttendanceSummaryProvider, EmployeeDirectory};

/// Item code for attendance-derived overtime pay.
pub const OVERTIME_ITEM_CODE: &str = "OVERTIME";

/// Item code for the net of approved manual adjustments.
pub const ADJUSTMENT_ITEM_CODE: &str = "ADJUSTMENT";

/// Calculates one employee's pay for one salary month.
#[derive(Clone)]
pub struct PayrollCalculator {
    directory: Arc<dyn EmployeeDirectory>,
    attendance: Arc<dyn AttendanceSummaryProvider>,
    ledger: AdjustmentLedger,
    components: PayComponentResolver,
    overtime: OvertimeConfig,
}

impl PayrollCalculator {
    /// Creates a calculator over the given collaborators.
    pub fn new(
        directory: Arc<dyn EmployeeDirectory>,
        attendance: Arc<dyn AttendanceSummaryProvider>,
        ledger: AdjustmentLedger,
        components: PayComponentResolver,
        overtime: OvertimeConfig,
    ) -> Self {
        Self {
            directory,
            attendance,
            ledger,
            components,
            overtime,
        }
    }

    /// Returns the overtime policy in use.
    pub fn overtime_policy(&self) -> &OvertimeConfig {
        &self.overtime
    }

    /// Calculates pay for the employee and month.
    ///
    /// The returned calculation is FAILED, with the error message as its
    /// failure reason, if the employee is unknown, attendance is missing or
    /// invalid, a collaborator errors, a pay component is invalid, or net pay
    /// would be negative. A negative net keeps the computed figures and
    /// carries a net pay of 0.
    pub async fn calculate(
        &self,
        employee_id: EmployeeId,
        salary_month: SalaryMonth,
    ) -> EmployeeCalculation {
        let mut trace = Vec::new();
        match self.run(employee_id, salary_month, &mut trace).await {
            Ok(calculation) => calculation,
            Err(error) => {
                warn!(
                    employee_id,
                    salary_month = %salary_month,
                    error = %error,
                    "Employee calculation failed"
                );
                EmployeeCalculation::failed(employee_id, salary_month, error.to_string(), trace)
            }
        }
    }

    async fn run(
        &self,
        employee_id: EmployeeId,
        salary_month: SalaryMonth,
        trace: &mut Vec<AuditStep>,
    ) -> EngineResult<EmployeeCalculation> {
        // Step 1: effective base salary
        let directory_salary = self.directory.base_salary(employee_id).await?;
        let active_raise = self.ledger.active_raise(employee_id, salary_month).await?;
        let base = resolve_base_salary(directory_salary, active_raise.as_ref(), 1);
        let base_salary = base.base_salary;
        trace.push(base.audit_step);

        // Step 2: overtime from attendance
        let attendance = self
            .attendance
            .summary(employee_id, salary_month)
            .await?
            .ok_or(EngineError::AttendanceNotFound {
                employee_id,
                salary_month,
            })?;
        let overtime =
            calculate_overtime_pay(employee_id, &attendance, base_salary, &self.overtime, 2)?;
        let overtime_pay = overtime.amount;
        trace.push(overtime.audit_step);

        // Step 3: allowances
        let active = self.components.active_components().await?;
        let allowances = resolve_allowances(&active.allowances, 3)?;
        trace.push(allowances.audit_step.clone());

        // Step 4: approved adjustments
        let adjustment_net = self.ledger.net_adjustment(employee_id, salary_month).await?;
        trace.push(adjustment_step(adjustment_net, 4));

        // Step 5: deductions, which may depend on gross pay
        let mut components = PayComponents {
            base_salary,
            allowances: allowances.total,
            overtime_pay,
            deductions: Decimal::ZERO,
            adjustment_net,
        };
        let gross_pay = gross_before_deductions(&components);
        let deductions = resolve_deductions(&active.deductions, base_salary, gross_pay, 5)?;
        components.deductions = deductions.total;
        trace.push(deductions.audit_step.clone());

        // Step 6: totals
        let totals = calculate_totals(&components, 6);
        trace.push(totals.audit_step.clone());

        let mut items = allowances.items;
        if overtime_pay > Decimal::ZERO {
            items.push(PayItem {
                kind: PayItemKind::Allowance,
                code: OVERTIME_ITEM_CODE.to_string(),
                name: "Overtime pay".to_string(),
                amount: overtime_pay,
                taxable: true,
            });
        }
        if !adjustment_net.is_zero() {
            let positive = adjustment_net > Decimal::ZERO;
            items.push(PayItem {
                kind: if positive {
                    PayItemKind::Allowance
                } else {
                    PayItemKind::Deduction
                },
                code: ADJUSTMENT_ITEM_CODE.to_string(),
                name: "Manual adjustment".to_string(),
                amount: adjustment_net.abs(),
                taxable: positive,
            });
        }
        items.extend(deductions.items);

        let (status, failure_reason) = match totals.unclamped_net {
            Some(net_pay) => {
                let error = EngineError::NegativeNetPay {
                    employee_id,
                    net_pay,
                };
                warn!(
                    employee_id,
                    salary_month = %salary_month,
                    net_pay = %net_pay,
                    "Negative net pay clamped to zero"
                );
                (CalculationStatus::Failed, Some(error.to_string()))
            }
            None => (CalculationStatus::Success, None),
        };

        debug!(
            employee_id,
            salary_month = %salary_month,
            gross_pay = %totals.gross_pay,
            net_pay = %totals.net_pay,
            "Employee calculated"
        );

        Ok(EmployeeCalculation {
            employee_id,
            salary_month,
            base_salary,
            total_allowances: allowances.total,
            total_deductions: totals.total_deductions,
            overtime_pay,
            adjustment_net,
            gross_pay: totals.gross_pay,
            net_pay: totals.net_pay,
            status,
            failure_reason,
            items,
            audit_trace: std::mem::take(trace),
        })
    }
}

impl std::fmt::Debug for PayrollCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayrollCalculator")
            .field("overtime", &self.overtime)
            .finish_non_exhaustive()
    }
}

fn adjustment_step(adjustment_net: Decimal, step_number: u32) -> AuditStep {
    let (to_gross, to_deductions) = if adjustment_net > Decimal::ZERO {
        (adjustment_net, Decimal::ZERO)
    } else {
        (Decimal::ZERO, -adjustment_net)
    };
    AuditStep {
        step_number,
        rule_id: "manual_adjustments".to_string(),
        rule_name: "Manual Adjustments".to_string(),
        input: serde_json::json!({
            "adjustment_net": adjustment_net.to_string()
        }),
        output: serde_json::json!({
            "added_to_gross": to_gross.to_string(),
            "added_to_deductions": to_deductions.to_string()
        }),
        reasoning: if adjustment_net.is_zero() {
            "No approved adjustments for the month".to_string()
        } else {
            format!("Net approved adjustments {}", adjustment_net)
        },
    }
}
