//! Read-only views over batches and their results.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{PaymentHistory, PayrollBatch, PayrollEmployeeResult};

/// One row of the batch list.
///
/// Totals cover SUCCESS results only, so `total_net` is the amount the batch
/// pays out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// The batch.
    #[serde(flatten)]
    pub batch: PayrollBatch,
    /// Number of employee results.
    pub employee_count: usize,
    /// Sum of gross pay.
    pub total_gross: Decimal,
    /// Sum of total deductions.
    pub total_deductions: Decimal,
    /// Sum of net pay.
    pub total_net: Decimal,
}

impl BatchSummary {
    /// Summarises a batch from its stored results.
    pub fn from_results(batch: PayrollBatch, results: &[PayrollEmployeeResult]) -> Self {
        let payable = results.iter().filter(|r| r.is_success());
        let (total_gross, total_deductions, total_net) = payable.fold(
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
            |(gross, deductions, net), r| {
                (
                    gross + r.calculation.gross_pay,
                    deductions + r.calculation.total_deductions,
                    net + r.calculation.net_pay,
                )
            },
        );
        Self {
            batch,
            employee_count: results.len(),
            total_gross,
            total_deductions,
            total_net,
        }
    }
}

/// Batch detail with result counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchDetail {
    /// The batch.
    #[serde(flatten)]
    pub batch: PayrollBatch,
    /// Number of employee results.
    pub total: usize,
    /// Results with status SUCCESS.
    pub success: usize,
    /// Results with status FAILED.
    pub failed: usize,
    /// Results with a payment history record.
    pub paid: usize,
}

impl BatchDetail {
    /// Counts a batch's results and payments.
    pub fn from_results(
        batch: PayrollBatch,
        results: &[PayrollEmployeeResult],
        payments: &[PaymentHistory],
    ) -> Self {
        let success = results.iter().filter(|r| r.is_success()).count();
        Self {
            batch,
            total: results.len(),
            success,
            failed: results.len() - success,
            paid: payments.len(),
        }
    }
}
