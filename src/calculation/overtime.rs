//! Attendance-derived overtime pay.
//!
//! Overtime pay is `overtime hours × hourly rate × multiplier`, rounded
//! half-up to a whole currency unit. The hourly rate is either configured
//! directly or derived from the effective base salary over the standard
//! monthly hours, truncated to a whole unit.

use rust_decimal::Decimal;

use super::rounding::{round_half_up, truncate_to_unit};
use crate::config::{HourlyRate, OvertimeConfig};
use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceSummary, AuditStep, EmployeeId};

/// The overtime pay figure and its audit step.
#[derive(Debug, Clone)]
pub struct OvertimeResult {
    /// The hourly rate the multiplier was applied to.
    pub hourly_rate: Decimal,
    /// Overtime pay for the month.
    pub amount: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Returns the hourly rate for the given base salary under the policy.
///
/// A derived rate needs positive standard monthly hours; anything else is
/// an `InvalidConfig` error.
pub fn overtime_hourly_rate(policy: &OvertimeConfig, base_salary: Decimal) -> EngineResult<Decimal> {
    match &policy.hourly_rate {
        HourlyRate::Fixed { amount } => Ok(*amount),
        HourlyRate::DerivedFromBase {
            standard_monthly_hours,
        } => {
            if *standard_monthly_hours <= Decimal::ZERO {
                return Err(EngineError::InvalidConfig {
                    field: "overtime.hourly_rate.standard_monthly_hours".to_string(),
                    message: format!("must be positive (got {})", standard_monthly_hours),
                });
            }
            base_salary
                .checked_div(*standard_monthly_hours)
                .map(truncate_to_unit)
                .ok_or_else(|| EngineError::InvalidConfig {
                    field: "overtime.hourly_rate.standard_monthly_hours".to_string(),
                    message: format!(
                        "hourly rate for base salary {} is out of range",
                        base_salary
                    ),
                })
        }
    }
}

/// Calculates overtime pay for the month.
///
/// # Arguments
///
/// * `employee_id` - The employee, for error reporting
/// * `attendance` - The month's attendance summary
/// * `base_salary` - The effective base salary, used by a derived hourly rate
/// * `policy` - The configured overtime policy
/// * `step_number` - The step number for audit trail sequencing
///
/// # Returns
///
/// Returns an `InvalidAttendance` error if the summary reports negative
/// overtime hours or so many that the pay is out of range.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_overtime_pay;
/// use payroll_engine::config::{HourlyRate, OvertimeConfig};
/// use payroll_engine::models::AttendanceSummary;
/// use rust_decimal::Decimal;
///
/// let policy = OvertimeConfig {
///     hourly_rate: HourlyRate::Fixed { amount: Decimal::from(20_000) },
///     multiplier: Decimal::ONE,
/// };
/// let attendance = AttendanceSummary {
///     work_days: 21,
///     work_hours: Decimal::from(172),
///     overtime_hours: Decimal::from(4),
/// };
///
/// let result = calculate_overtime_pay(1, &attendance, Decimal::from(3_300_000), &policy, 2).unwrap();
/// assert_eq!(result.amount, Decimal::from(80_000));
/// ```
pub fn calculate_overtime_pay(
    employee_id: EmployeeId,
    attendance: &AttendanceSummary,
    base_salary: Decimal,
    policy: &OvertimeConfig,
    step_number: u32,
) -> EngineResult<OvertimeResult> {
    if attendance.overtime_hours < Decimal::ZERO {
        return Err(EngineError::InvalidAttendance {
            employee_id,
            message: format!(
                "overtime hours must not be negative (got {})",
                attendance.overtime_hours
            ),
        });
    }

    let hourly_rate = overtime_hourly_rate(policy, base_salary)?;
    let amount = attendance
        .overtime_hours
        .checked_mul(hourly_rate)
        .and_then(|pay| pay.checked_mul(policy.multiplier))
        .map(round_half_up)
        .ok_or_else(|| EngineError::InvalidAttendance {
            employee_id,
            message: format!(
                "overtime pay for {} hours is out of range",
                attendance.overtime_hours.normalize()
            ),
        })?;

    let rate_source = match policy.hourly_rate {
        HourlyRate::Fixed { .. } => "fixed".to_string(),
        HourlyRate::DerivedFromBase {
            standard_monthly_hours,
        } => format!("base_salary / {}", standard_monthly_hours.normalize()),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "overtime_pay".to_string(),
        rule_name: "Overtime Pay".to_string(),
        input: serde_json::json!({
            "overtime_hours": attendance.overtime_hours.normalize().to_string(),
            "work_hours": attendance.work_hours.normalize().to_string(),
            "base_salary": base_salary.to_string(),
            "rate_source": rate_source,
            "multiplier": policy.multiplier.normalize().to_string()
        }),
        output: serde_json::json!({
            "hourly_rate": hourly_rate.normalize().to_string(),
            "amount": amount.to_string()
        }),
        reasoning: format!(
            "{}h × {} × {} = {}",
            attendance.overtime_hours.normalize(),
            hourly_rate.normalize(),
            policy.multiplier.normalize(),
            amount
        ),
    };

    Ok(OvertimeResult {
        hourly_rate,
        amount,
        audit_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn attendance(overtime: &str) -> AttendanceSummary {
        AttendanceSummary {
            work_days: 20,
            work_hours: dec("160"),
            overtime_hours: dec(overtime),
        }
    }

    fn derived_policy() -> OvertimeConfig {
        OvertimeConfig::default()
    }

    #[test]
    fn test_fixed_rate_overtime() {
        let policy = OvertimeConfig {
            hourly_rate: HourlyRate::Fixed {
                amount: dec("20000"),
            },
            multiplier: dec("1.0"),
        };
        let result = calculate_overtime_pay(1, &attendance("4"), dec("3300000"), &policy, 1).unwrap();
        assert_eq!(result.hourly_rate, dec("20000"));
        assert_eq!(result.amount, dec("80000"));
    }

    #[test]
    fn test_derived_rate_truncates_then_rounds_half_up() {
        // 3,000,000 / 209 = 14354.06..., truncated to 14354.
        // 2.5h × 14354 × 1.5 = 53827.5, rounded to 53828.
        let result =
            calculate_overtime_pay(1, &attendance("2.5"), dec("3000000"), &derived_policy(), 1)
                .unwrap();
        assert_eq!(result.hourly_rate, dec("14354"));
        assert_eq!(result.amount, dec("53828"));
    }

    #[test]
    fn test_zero_overtime_pays_nothing() {
        let result =
            calculate_overtime_pay(1, &attendance("0"), dec("3000000"), &derived_policy(), 1)
                .unwrap();
        assert_eq!(result.amount, Decimal::ZERO);
    }

    #[test]
    fn test_negative_overtime_is_rejected() {
        match calculate_overtime_pay(9, &attendance("-1"), dec("3000000"), &derived_policy(), 1) {
            Err(EngineError::InvalidAttendance { employee_id, .. }) => assert_eq!(employee_id, 9),
            other => panic!("Expected InvalidAttendance, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_standard_hours_is_invalid_config() {
        let policy = OvertimeConfig {
            hourly_rate: HourlyRate::DerivedFromBase {
                standard_monthly_hours: Decimal::ZERO,
            },
            multiplier: dec("1.5"),
        };
        match calculate_overtime_pay(1, &attendance("2"), dec("3000000"), &policy, 1) {
            Err(EngineError::InvalidConfig { field, .. }) => {
                assert_eq!(field, "overtime.hourly_rate.standard_monthly_hours");
            }
            other => panic!("Expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_overflowing_overtime_hours_is_invalid_attendance() {
        let result = calculate_overtime_pay(
            2,
            &attendance("79228162514264337593543950"),
            dec("3000000"),
            &derived_policy(),
            1,
        );
        match result {
            Err(EngineError::InvalidAttendance { employee_id, .. }) => assert_eq!(employee_id, 2),
            other => panic!("Expected InvalidAttendance, got {:?}", other),
        }
    }

    #[test]
    fn test_audit_step_records_rate_source() {
        let result =
            calculate_overtime_pay(1, &attendance("1"), dec("3000000"), &derived_policy(), 4)
                .unwrap();
        assert_eq!(result.audit_step.step_number, 4);
        assert_eq!(result.audit_step.input["rate_source"], "base_salary / 209");
    }
}
