//! Allowance and deduction master definitions.
//!
//! Master records describe the pay components the company uses. They are
//! keyed by a natural `code` and carry an `active` flag: inactive records are
//! kept for history but never applied to new calculations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A fixed-amount allowance paid on top of base salary.
///
/// # Example
///
/// ```
/// use payroll_engine::models::AllowanceDefinition;
///
/// let yaml = r#"
/// code: MEAL
/// name: Meal allowance
/// default_amount: "200000"
/// taxable: false
/// "#;
/// let meal: AllowanceDefinition = serde_yaml::from_str(yaml).unwrap();
/// assert!(meal.active);
/// assert!(!meal.taxable);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceDefinition {
    /// Natural key, e.g. `MEAL`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Amount paid per month.
    pub default_amount: Decimal,
    /// Whether the allowance is taxable income.
    #[serde(default = "default_true")]
    pub taxable: bool,
    /// Whether the allowance participates in new calculations.
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Classification of a deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionType {
    /// Income and local taxes.
    Tax,
    /// Social insurance contributions.
    Insurance,
    /// Anything else (union fees, loans).
    Etc,
}

/// The figure a rate-based deduction is applied to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateBasis {
    /// The effective (raise-adjusted) base salary.
    #[default]
    BaseSalary,
    /// Gross pay before deductions.
    GrossPay,
}

/// How a deduction amount is computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeductionCalculation {
    /// A flat amount.
    Fixed {
        /// The amount withheld.
        amount: Decimal,
    },
    /// A percentage of a basis figure.
    Rate {
        /// Percentage, 0 to 100.
        percent: Decimal,
        /// The figure the percentage applies to.
        #[serde(default)]
        basis: RateBasis,
    },
}

/// A deduction withheld from pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionDefinition {
    /// Natural key, e.g. `NPS`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Classification.
    pub deduction_type: DeductionType,
    /// Fixed amount or rate.
    pub calculation: DeductionCalculation,
    /// Whether the deduction participates in new calculations.
    #[serde(default = "default_true")]
    pub active: bool,
}
