//! Calculation logic for the Payroll Batch Engine.
//!
//! This module contains the pure calculation steps (effective base salary,
//! overtime pay, gross/deduction/net totals, currency rounding) and the
//! [`PayrollCalculator`] that runs them for one employee and salary month.

mod base_salary;
mod engine;
mod overtime;
mod rounding;
mod totals;

pub use base_salary::{BaseSalaryResult, resolve_base_salary};
pub use engine::{ADJUSTMENT_ITEM_CODE, OVERTIME_ITEM_CODE, PayrollCalculator};
pub use overtime::{OvertimeResult, calculate_overtime_pay, overtime_hourly_rate};
pub use rounding::{round_half_up, truncate_to_unit};
pub use totals::{PayComponents, PayTotals, calculate_totals, gross_before_deductions};
