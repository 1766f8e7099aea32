//! Effective base salary resolution.
//!
//! The directory's stored base salary applies unless an approved raise is in
//! effect for the salary month, in which case the raise's after-salary
//! replaces it.

use rust_decimal::Decimal;

use crate::models::{AuditStep, PayrollRaise};

/// The effective base salary and the audit step recording its source.
#[derive(Debug, Clone)]
pub struct BaseSalaryResult {
    /// Base salary to use for the month.
    pub base_salary: Decimal,
    /// The audit step recording this resolution.
    pub audit_step: AuditStep,
}

/// Resolves the base salary for the month.
///
/// # Arguments
///
/// * `directory_salary` - The base salary stored in the employee directory
/// * `active_raise` - The approved raise in effect for the month, if any
/// * `step_number` - The step number for audit trail sequencing
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::resolve_base_salary;
/// use rust_decimal::Decimal;
///
/// let result = resolve_base_salary(Decimal::from(3_000_000), None, 1);
/// assert_eq!(result.base_salary, Decimal::from(3_000_000));
/// assert_eq!(result.audit_step.output["source"], "directory");
/// ```
pub fn resolve_base_salary(
    directory_salary: Decimal,
    active_raise: Option<&PayrollRaise>,
    step_number: u32,
) -> BaseSalaryResult {
    let Some(raise) = active_raise else {
        return BaseSalaryResult {
            base_salary: directory_salary,
            audit_step: AuditStep {
                step_number,
                rule_id: "base_salary".to_string(),
                rule_name: "Base Salary".to_string(),
                input: serde_json::json!({
                    "directory_salary": directory_salary.to_string(),
                    "raise_id": null
                }),
                output: serde_json::json!({
                    "base_salary": directory_salary.to_string(),
                    "source": "directory"
                }),
                reasoning: format!(
                    "No approved raise for the month; using stored base salary {}",
                    directory_salary
                ),
            },
        };
    };

    let base_salary = raise.after_salary;
    BaseSalaryResult {
        base_salary,
        audit_step: AuditStep {
            step_number,
            rule_id: "base_salary".to_string(),
            rule_name: "Base Salary".to_string(),
            input: serde_json::json!({
                "directory_salary": directory_salary.to_string(),
                "raise_id": raise.id,
                "before_salary": raise.before_salary.to_string(),
                "after_salary": raise.after_salary.to_string(),
                "raise_percent": raise.raise_percent.map(|p| p.normalize().to_string())
            }),
            output: serde_json::json!({
                "base_salary": base_salary.to_string(),
                "source": "raise"
            }),
            reasoning: format!(
                "Approved raise #{} replaces base salary {} with {}",
                raise.id, directory_salary, base_salary
            ),
        },
    }
}
