//! Gross, deduction and net pay totals.
//!
//! A positive net adjustment is paid as an allowance and a negative one is
//! withheld as a deduction:
//!
//! ```text
//! gross      = base + allowances + overtime + max(adjustment, 0)
//! deductions = deductions + max(-adjustment, 0)
//! net        = gross - deductions, clamped at 0
//! ```

use rust_decimal::Decimal;

use crate::models::AuditStep;

/// Figures that feed the totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayComponents {
    /// Effective base salary.
    pub base_salary: Decimal,
    /// Sum of allowances.
    pub allowances: Decimal,
    /// Overtime pay.
    pub overtime_pay: Decimal,
    /// Sum of deductions from the master list.
    pub deductions: Decimal,
    /// Signed net of approved manual adjustments.
    pub adjustment_net: Decimal,
}

/// Computed totals.
#[derive(Debug, Clone)]
pub struct PayTotals {
    /// Pay before deductions.
    pub gross_pay: Decimal,
    /// All deductions, including a negative adjustment.
    pub total_deductions: Decimal,
    /// Pay after deductions, never negative.
    pub net_pay: Decimal,
    /// The net before clamping, when it was negative.
    pub unclamped_net: Option<Decimal>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

impl PayTotals {
    /// True when deductions exceeded gross pay and net pay was clamped.
    pub fn was_clamped(&self) -> bool {
        self.unclamped_net.is_some()
    }
}

/// Gross pay before deductions, without the adjustment split.
pub fn gross_before_deductions(components: &PayComponents) -> Decimal {
    components.base_salary
        + components.allowances
        + components.overtime_pay
        + components.adjustment_net.max(Decimal::ZERO)
}

/// Computes gross, total deductions and net pay.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::{PayComponents, calculate_totals};
/// use rust_decimal::Decimal;
///
/// let totals = calculate_totals(
///     &PayComponents {
///         base_salary: Decimal::from(3_300_000),
///         allowances: Decimal::from(200_000),
///         overtime_pay: Decimal::from(80_000),
///         deductions: Decimal::from(150_000),
///         adjustment_net: Decimal::from(-50_000),
///     },
///     5,
/// );
///
/// assert_eq!(totals.gross_pay, Decimal::from(3_580_000));
/// assert_eq!(totals.total_deductions, Decimal::from(200_000));
/// assert_eq!(totals.net_pay, Decimal::from(3_380_000));
/// ```
pub fn calculate_totals(components: &PayComponents, step_number: u32) -> PayTotals {
    let gross_pay = gross_before_deductions(components);
    let total_deductions =
        components.deductions + (-components.adjustment_net).max(Decimal::ZERO);
    let net = gross_pay - total_deductions;

    let (net_pay, unclamped_net) = if net < Decimal::ZERO {
        (Decimal::ZERO, Some(net))
    } else {
        (net, None)
    };

    let reasoning = match unclamped_net {
        Some(raw) => format!(
            "Gross {} − deductions {} = {}; negative net clamped to 0",
            gross_pay, total_deductions, raw
        ),
        None => format!(
            "Gross {} − deductions {} = net {}",
            gross_pay, total_deductions, net_pay
        ),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "pay_totals".to_string(),
        rule_name: "Pay Totals".to_string(),
        input: serde_json::json!({
            "base_salary": components.base_salary.to_string(),
            "allowances": components.allowances.to_string(),
            "overtime_pay": components.overtime_pay.to_string(),
            "deductions": components.deductions.to_string(),
            "adjustment_net": components.adjustment_net.to_string()
        }),
        output: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "total_deductions": total_deductions.to_string(),
            "net_pay": net_pay.to_string(),
            "clamped": unclamped_net.is_some()
        }),
        reasoning,
    };

    PayTotals {
        gross_pay,
        total_deductions,
        net_pay,
        unclamped_net,
        audit_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn components(adjustment: &str) -> PayComponents {
        PayComponents {
            base_salary: dec("3000000"),
            allowances: dec("200000"),
            overtime_pay: dec("0"),
            deductions: dec("150000"),
            adjustment_net: dec(adjustment),
        }
    }

    #[test]
    fn test_positive_adjustment_adds_to_gross() {
        let totals = calculate_totals(&components("100000"), 1);
        assert_eq!(totals.gross_pay, dec("3300000"));
        assert_eq!(totals.total_deductions, dec("150000"));
        assert_eq!(totals.net_pay, dec("3150000"));
        assert!(!totals.was_clamped());
    }

    #[test]
    fn test_negative_adjustment_adds_to_deductions() {
        let totals = calculate_totals(&components("-50000"), 1);
        assert_eq!(totals.gross_pay, dec("3200000"));
        assert_eq!(totals.total_deductions, dec("200000"));
        assert_eq!(totals.net_pay, dec("3000000"));
    }

    #[test]
    fn test_negative_net_is_clamped() {
        let totals = calculate_totals(&components("-5000000"), 1);
        assert_eq!(totals.gross_pay, dec("3200000"));
        assert_eq!(totals.total_deductions, dec("5150000"));
        assert_eq!(totals.net_pay, Decimal::ZERO);
        assert_eq!(totals.unclamped_net, Some(dec("-1950000")));
        assert_eq!(totals.audit_step.output["clamped"], true);
    }

    #[test]
    fn test_net_exactly_zero_is_not_clamped() {
        let totals = calculate_totals(&components("-3050000"), 1);
        assert_eq!(totals.net_pay, Decimal::ZERO);
        assert!(!totals.was_clamped());
    }
}
