//! Collaborator and persistence seams.
//!
//! The engine never talks to a database or an HR system directly. Every
//! external dependency is an async trait defined here:
//!
//! - [`EmployeeDirectory`]: base salaries and the batch target list
//! - [`AttendanceSummaryProvider`]: monthly worked/overtime hours
//! - [`ApprovalStore`]: adjustment and raise records from the approval workflow
//! - [`PayComponentStore`]: the allowance/deduction master list
//! - [`PayrollRepository`]: batches, employee results and payment history
//!
//! [`memory`] provides thread-safe in-memory implementations of all of them.

pub mod memory;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::EngineResult;
use crate::models::{
    AllowanceDefinition, AttendanceSummary, BatchId, BatchStatus, DeductionDefinition,
    EmployeeCalculation, EmployeeId, PaymentHistory, PayrollAdjustment, PayrollBatch,
    PayrollEmployeeResult, PayrollRaise, SalaryMonth,
};

pub use memory::{
    InMemoryApprovalStore, InMemoryAttendanceProvider, InMemoryEmployeeDirectory,
    InMemoryPayComponentStore, InMemoryPayrollRepository,
};

/// Source of employee salary data and the batch target list.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// The employee's stored base salary. Fails with `EmployeeNotFound`.
    async fn base_salary(&self, employee_id: EmployeeId) -> EngineResult<Decimal>;

    /// Employees included in a batch when no explicit list is given.
    async fn list_batch_target_employees(&self) -> EngineResult<Vec<EmployeeId>>;
}

/// Source of monthly attendance summaries.
#[async_trait]
pub trait AttendanceSummaryProvider: Send + Sync {
    /// The summary for the employee and month, or `None` if there is no data.
    async fn summary(
        &self,
        employee_id: EmployeeId,
        salary_month: SalaryMonth,
    ) -> EngineResult<Option<AttendanceSummary>>;
}

/// Read access to records produced by the approval workflow.
///
/// Implementations may return records in any approval state; the
/// [`AdjustmentLedger`](crate::ledger::AdjustmentLedger) filters them.
#[async_trait]
pub trait ApprovalStore: Send + Sync {
    /// Adjustments for the employee whose effective month is `salary_month`.
    async fn adjustments(
        &self,
        employee_id: EmployeeId,
        salary_month: SalaryMonth,
    ) -> EngineResult<Vec<PayrollAdjustment>>;

    /// Raises for the employee whose effective month is `salary_month`.
    async fn raises(
        &self,
        employee_id: EmployeeId,
        salary_month: SalaryMonth,
    ) -> EngineResult<Vec<PayrollRaise>>;
}

/// Read access to the allowance/deduction master list.
#[async_trait]
pub trait PayComponentStore: Send + Sync {
    /// Active allowance definitions.
    async fn list_active_allowances(&self) -> EngineResult<Vec<AllowanceDefinition>>;

    /// Active deduction definitions.
    async fn list_active_deductions(&self) -> EngineResult<Vec<DeductionDefinition>>;
}

/// Filter for batch listings. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchFilter {
    /// Only batches for this month.
    pub salary_month: Option<SalaryMonth>,
    /// Only batches in this status.
    pub status: Option<BatchStatus>,
}

impl BatchFilter {
    /// True if the batch passes the filter.
    pub fn matches(&self, batch: &PayrollBatch) -> bool {
        self.salary_month.is_none_or(|m| m == batch.salary_month)
            && self.status.is_none_or(|s| s == batch.status)
    }
}

/// Outcome of recording a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    /// The payment history for the result.
    pub history: PaymentHistory,
    /// False when the result had already been paid and nothing was written.
    pub created: bool,
}

/// Persistence for batches, employee results and payment history.
#[async_trait]
pub trait PayrollRepository: Send + Sync {
    /// Stores a new READY batch. Fails with `DuplicateBatch` if the month
    /// already has one.
    async fn insert_batch(
        &self,
        salary_month: SalaryMonth,
        now: DateTime<Utc>,
    ) -> EngineResult<PayrollBatch>;

    /// Looks a batch up by id.
    async fn find_batch(&self, batch_id: BatchId) -> EngineResult<Option<PayrollBatch>>;

    /// Looks a batch up by salary month.
    async fn find_batch_by_month(
        &self,
        salary_month: SalaryMonth,
    ) -> EngineResult<Option<PayrollBatch>>;

    /// Overwrites a stored batch.
    async fn update_batch(&self, batch: &PayrollBatch) -> EngineResult<()>;

    /// Batches passing the filter, newest month first.
    async fn list_batches(&self, filter: &BatchFilter) -> EngineResult<Vec<PayrollBatch>>;

    /// Inserts or overwrites the result for `(batch_id, employee)`. An
    /// overwritten result keeps its id.
    async fn save_result(
        &self,
        batch_id: BatchId,
        calculation: EmployeeCalculation,
        now: DateTime<Utc>,
    ) -> EngineResult<PayrollEmployeeResult>;

    /// All results of a batch, ordered by employee id.
    async fn results_for_batch(&self, batch_id: BatchId)
    -> EngineResult<Vec<PayrollEmployeeResult>>;

    /// Deletes the batch's results for employees not in `keep` and returns
    /// how many were removed.
    async fn remove_results_except(
        &self,
        batch_id: BatchId,
        keep: &BTreeSet<EmployeeId>,
    ) -> EngineResult<usize>;

    /// Records a payment for the result unless one already exists.
    async fn record_payment(
        &self,
        result: &PayrollEmployeeResult,
        paid_at: DateTime<Utc>,
    ) -> EngineResult<PaymentRecord>;

    /// Payments made for a batch, ordered by payment id.
    async fn payments_for_batch(&self, batch_id: BatchId) -> EngineResult<Vec<PaymentHistory>>;
}
