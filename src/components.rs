//! Pay component resolution.
//!
//! Turns the allowance and deduction master list into payslip items for one
//! employee. Allowances pay their default amount. Deductions are either a
//! fixed amount or a percentage of the base salary or gross pay, rounded
//! half-up to a whole currency unit.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::calculation::round_half_up;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AllowanceDefinition, AuditStep, DeductionCalculation, DeductionDefinition, PayItem,
    PayItemKind, RateBasis,
};
use crate::store::PayComponentStore;

/// Resolved allowance items and their total.
#[derive(Debug, Clone)]
pub struct AllowanceResolution {
    /// One item per active allowance.
    pub items: Vec<PayItem>,
    /// Sum of the item amounts.
    pub total: Decimal,
    /// The audit step recording this resolution.
    pub audit_step: AuditStep,
}

/// Resolved deduction items and their total.
#[derive(Debug, Clone)]
pub struct DeductionResolution {
    /// One item per active deduction.
    pub items: Vec<PayItem>,
    /// Sum of the item amounts.
    pub total: Decimal,
    /// The audit step recording this resolution.
    pub audit_step: AuditStep,
}

/// Resolves the active allowances into payslip items.
///
/// Inactive definitions are skipped. A negative default amount fails with
/// `InvalidPayComponent`.
pub fn resolve_allowances(
    allowances: &[AllowanceDefinition],
    step_number: u32,
) -> EngineResult<AllowanceResolution> {
    let mut items = Vec::new();
    for allowance in allowances.iter().filter(|a| a.active) {
        if allowance.default_amount < Decimal::ZERO {
            return Err(EngineError::InvalidPayComponent {
                code: allowance.code.clone(),
                message: format!("negative amount {}", allowance.default_amount),
            });
        }
        items.push(PayItem {
            kind: PayItemKind::Allowance,
            code: allowance.code.clone(),
            name: allowance.name.clone(),
            amount: allowance.default_amount,
            taxable: allowance.taxable,
        });
    }

    let total: Decimal = items.iter().map(|i| i.amount).sum();
    let audit_step = AuditStep {
        step_number,
        rule_id: "allowances".to_string(),
        rule_name: "Allowances".to_string(),
        input: serde_json::json!({
            "active_codes": items.iter().map(|i| i.code.as_str()).collect::<Vec<_>>()
        }),
        output: serde_json::json!({
            "items": items
                .iter()
                .map(|i| serde_json::json!({ "code": i.code, "amount": i.amount.to_string() }))
                .collect::<Vec<_>>(),
            "total": total.to_string()
        }),
        reasoning: format!("{} active allowances totalling {}", items.len(), total),
    };

    Ok(AllowanceResolution {
        items,
        total,
        audit_step,
    })
}

/// Computes one deduction amount.
///
/// # Examples
///
/// ```
/// use payroll_engine::components::deduction_amount;
/// use payroll_engine::models::{DeductionCalculation, DeductionDefinition, DeductionType, RateBasis};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let nps = DeductionDefinition {
///     code: "NPS".to_string(),
///     name: "National pension".to_string(),
///     description: String::new(),
///     deduction_type: DeductionType::Insurance,
///     calculation: DeductionCalculation::Rate {
///         percent: Decimal::from_str("4.5").unwrap(),
///         basis: RateBasis::BaseSalary,
///     },
///     active: true,
/// };
///
/// let amount = deduction_amount(&nps, Decimal::from(3_300_000), Decimal::from(3_580_000)).unwrap();
/// assert_eq!(amount, Decimal::from(148_500));
/// ```
pub fn deduction_amount(
    deduction: &DeductionDefinition,
    base_salary: Decimal,
    gross_pay: Decimal,
) -> EngineResult<Decimal> {
    match &deduction.calculation {
        DeductionCalculation::Fixed { amount } => {
            if *amount < Decimal::ZERO {
                return Err(EngineError::InvalidPayComponent {
                    code: deduction.code.clone(),
                    message: format!("negative amount {}", amount),
                });
            }
            Ok(*amount)
        }
        DeductionCalculation::Rate { percent, basis } => {
            if *percent < Decimal::ZERO || *percent > Decimal::ONE_HUNDRED {
                return Err(EngineError::InvalidPayComponent {
                    code: deduction.code.clone(),
                    message: format!("rate {}% is outside 0..=100", percent.normalize()),
                });
            }
            let basis_amount = match basis {
                RateBasis::BaseSalary => base_salary,
                RateBasis::GrossPay => gross_pay,
            };
            basis_amount
                .checked_mul(*percent)
                .map(|scaled| round_half_up(scaled / Decimal::ONE_HUNDRED))
                .ok_or_else(|| EngineError::InvalidPayComponent {
                    code: deduction.code.clone(),
                    message: format!("{}% of {} is out of range", percent.normalize(), basis_amount),
                })
        }
    }
}

/// Resolves the active deductions into payslip items.
///
/// # Arguments
///
/// * `deductions` - The deduction master list
/// * `base_salary` - The effective base salary (rate basis `base_salary`)
/// * `gross_pay` - Gross pay before deductions (rate basis `gross_pay`)
/// * `step_number` - The step number for audit trail sequencing
pub fn resolve_deductions(
    deductions: &[DeductionDefinition],
    base_salary: Decimal,
    gross_pay: Decimal,
    step_number: u32,
) -> EngineResult<DeductionResolution> {
    let mut items = Vec::new();
    for deduction in deductions.iter().filter(|d| d.active) {
        let amount = deduction_amount(deduction, base_salary, gross_pay)?;
        items.push(PayItem {
            kind: PayItemKind::Deduction,
            code: deduction.code.clone(),
            name: deduction.name.clone(),
            amount,
            taxable: false,
        });
    }

    let total: Decimal = items.iter().map(|i| i.amount).sum();
    let audit_step = AuditStep {
        step_number,
        rule_id: "deductions".to_string(),
        rule_name: "Deductions".to_string(),
        input: serde_json::json!({
            "base_salary": base_salary.to_string(),
            "gross_pay": gross_pay.to_string(),
            "active_codes": items.iter().map(|i| i.code.as_str()).collect::<Vec<_>>()
        }),
        output: serde_json::json!({
            "items": items
                .iter()
                .map(|i| serde_json::json!({ "code": i.code, "amount": i.amount.to_string() }))
                .collect::<Vec<_>>(),
            "total": total.to_string()
        }),
        reasoning: format!("{} active deductions totalling {}", items.len(), total),
    };

    Ok(DeductionResolution {
        items,
        total,
        audit_step,
    })
}

/// The active master list at the time of a calculation.
#[derive(Debug, Clone, Default)]
pub struct ActiveComponents {
    /// Active allowance definitions.
    pub allowances: Vec<AllowanceDefinition>,
    /// Active deduction definitions.
    pub deductions: Vec<DeductionDefinition>,
}

/// Reads the active master list from a [`PayComponentStore`].
#[derive(Clone)]
pub struct PayComponentResolver {
    store: Arc<dyn PayComponentStore>,
}

impl PayComponentResolver {
    /// Creates a resolver over the given store.
    pub fn new(store: Arc<dyn PayComponentStore>) -> Self {
        Self { store }
    }

    /// Fetches the active allowances and deductions.
    pub async fn active_components(&self) -> EngineResult<ActiveComponents> {
        let allowances = self.store.list_active_allowances().await?;
        let deductions = self.store.list_active_deductions().await?;
        Ok(ActiveComponents {
            allowances: allowances.into_iter().filter(|a| a.active).collect(),
            deductions: deductions.into_iter().filter(|d| d.active).collect(),
        })
    }
}

impl std::fmt::Debug for PayComponentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayComponentResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeductionType;
    use crate::store::InMemoryPayComponentStore;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn allowance(code: &str, amount: &str, active: bool) -> AllowanceDefinition {
        AllowanceDefinition {
            code: code.to_string(),
            name: code.to_string(),
            description: String::new(),
            default_amount: dec(amount),
            taxable: true,
            active,
        }
    }

    fn deduction(code: &str, calculation: DeductionCalculation, active: bool) -> DeductionDefinition {
        DeductionDefinition {
            code: code.to_string(),
            name: code.to_string(),
            description: String::new(),
            deduction_type: DeductionType::Etc,
            calculation,
            active,
        }
    }

    fn rate(percent: &str, basis: RateBasis) -> DeductionCalculation {
        DeductionCalculation::Rate {
            percent: dec(percent),
            basis,
        }
    }

    #[test]
    fn test_inactive_allowances_are_excluded() {
        let result = resolve_allowances(
            &[
                allowance("MEAL", "200000", true),
                allowance("NIGHT", "50000", false),
            ],
            1,
        )
        .unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.total, dec("200000"));
    }

    #[test]
    fn test_no_allowances_total_zero() {
        let result = resolve_allowances(&[], 1).unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.total, Decimal::ZERO);
    }

    #[test]
    fn test_rate_deduction_rounds_half_up() {
        // 3,000,000 × 3.545% = 106,350 exactly; 3,000,001 × 3.545% = 106,350.035
        let hi = deduction("HI", rate("3.545", RateBasis::BaseSalary), true);
        assert_eq!(deduction_amount(&hi, dec("3000000"), dec("0")).unwrap(), dec("106350"));
        assert_eq!(deduction_amount(&hi, dec("3000001"), dec("0")).unwrap(), dec("106350"));

        // 10,000,015 × 3.3% = 330,000.495 → 330,000; 10,000,030 × 3.3% = 330,000.99 → 330,001
        let tax = deduction("TAX", rate("3.3", RateBasis::GrossPay), true);
        assert_eq!(deduction_amount(&tax, dec("0"), dec("10000015")).unwrap(), dec("330000"));
        assert_eq!(deduction_amount(&tax, dec("0"), dec("10000030")).unwrap(), dec("330001"));

        // 15 × 10% = 1.5 → 2
        let ten = deduction("TEN", rate("10", RateBasis::BaseSalary), true);
        assert_eq!(deduction_amount(&ten, dec("15"), dec("0")).unwrap(), dec("2"));
    }

    #[test]
    fn test_rate_basis_selects_figure() {
        let on_gross = deduction("G", rate("10", RateBasis::GrossPay), true);
        assert_eq!(
            deduction_amount(&on_gross, dec("1000"), dec("2000")).unwrap(),
            dec("200")
        );
    }

    #[test]
    fn test_rate_out_of_range_is_invalid_component() {
        let bad = deduction("BAD", rate("150", RateBasis::BaseSalary), true);
        match resolve_deductions(&[bad], dec("1000"), dec("1000"), 1) {
            Err(EngineError::InvalidPayComponent { code, .. }) => assert_eq!(code, "BAD"),
            other => panic!("Expected InvalidPayComponent, got {:?}", other),
        }
    }

    #[test]
    fn test_rate_on_huge_basis_is_invalid_component() {
        let tax = deduction("TAX", rate("50", RateBasis::GrossPay), true);
        match deduction_amount(&tax, dec("1000"), Decimal::MAX) {
            Err(EngineError::InvalidPayComponent { code, message }) => {
                assert_eq!(code, "TAX");
                assert!(message.contains("out of range"));
            }
            other => panic!("Expected InvalidPayComponent, got {:?}", other),
        }
    }

    #[test]
    fn test_inactive_invalid_deduction_is_ignored() {
        let bad = deduction("BAD", rate("150", RateBasis::BaseSalary), false);
        let fixed = deduction(
            "FEE",
            DeductionCalculation::Fixed {
                amount: dec("15000"),
            },
            true,
        );
        let result = resolve_deductions(&[bad, fixed], dec("1000"), dec("1000"), 2).unwrap();
        assert_eq!(result.total, dec("15000"));
        assert_eq!(result.items[0].kind, PayItemKind::Deduction);
        assert_eq!(result.audit_step.step_number, 2);
    }

    #[tokio::test]
    async fn test_resolver_reads_active_components_from_store() {
        let store = Arc::new(InMemoryPayComponentStore::new());
        store.upsert_allowance(allowance("MEAL", "200000", true));
        store.upsert_allowance(allowance("OLD", "1", false));
        store.upsert_deduction(deduction(
            "NPS",
            rate("4.5", RateBasis::BaseSalary),
            true,
        ));

        let resolver = PayComponentResolver::new(store);
        let active = resolver.active_components().await.unwrap();
        assert_eq!(active.allowances.len(), 1);
        assert_eq!(active.deductions.len(), 1);
    }
}
