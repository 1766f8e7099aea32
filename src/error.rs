//! Error types for the Payroll Batch Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while running a payroll batch.
//!
//! Errors fall into two groups. Business-rule errors (invalid lifecycle
//! transitions, duplicate batches, locked batches) are returned to the caller
//! of a batch operation. Per-employee errors (missing attendance, unknown
//! employee, negative net pay) never leave a batch operation: the engine
//! captures them as the failure reason of that employee's result.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{BatchAction, BatchId, BatchStatus, EmployeeId, SalaryMonth};

/// The main error type for the Payroll Batch Engine.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
/// use payroll_engine::models::SalaryMonth;
///
/// let month: SalaryMonth = "2025-12".parse().unwrap();
/// let error = EngineError::DuplicateBatch { salary_month: month };
/// assert_eq!(error.to_string(), "A payroll batch already exists for salary month 2025-12");
/// assert!(error.is_business_rule());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but contains an unusable value.
    #[error("Invalid configuration value '{field}': {message}")]
    InvalidConfig {
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        message: String,
    },

    /// A salary month string was not of the form `YYYY-MM`.
    #[error("Invalid salary month '{value}': expected YYYY-MM")]
    InvalidSalaryMonth {
        /// The rejected input.
        value: String,
    },

    /// A lifecycle transition was attempted from the wrong state.
    #[error("Payroll batch {batch_id} cannot {action} while {from}")]
    InvalidTransition {
        /// The batch the transition was attempted on.
        batch_id: BatchId,
        /// The status the batch was in.
        from: BatchStatus,
        /// The attempted action.
        action: BatchAction,
    },

    /// A batch already exists for the requested salary month.
    #[error("A payroll batch already exists for salary month {salary_month}")]
    DuplicateBatch {
        /// The month that already has a batch.
        salary_month: SalaryMonth,
    },

    /// No batch exists with the given id.
    #[error("Payroll batch not found: {batch_id}")]
    BatchNotFound {
        /// The missing batch id.
        batch_id: BatchId,
    },

    /// The batch is CONFIRMED or PAID and its results can no longer change.
    #[error("Payroll batch {batch_id} is locked ({status}); results cannot be recalculated")]
    BatchLocked {
        /// The locked batch.
        batch_id: BatchId,
        /// The status that locks it.
        status: BatchStatus,
    },

    /// The batch has no target employees or no recorded results.
    #[error("Payroll batch {batch_id} has no employees to process")]
    EmptyBatch {
        /// The empty batch.
        batch_id: BatchId,
    },

    /// The batch still holds FAILED results and the configuration forbids confirming it.
    #[error("Payroll batch {batch_id} has {failed_count} failed results")]
    FailedResultsPresent {
        /// The batch being confirmed.
        batch_id: BatchId,
        /// Number of FAILED results.
        failed_count: usize,
    },

    /// The employee directory has no record of the employee.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The unknown employee.
        employee_id: EmployeeId,
    },

    /// No attendance summary exists for the employee and month.
    #[error("Attendance data missing for employee {employee_id} in {salary_month}")]
    AttendanceNotFound {
        /// The employee.
        employee_id: EmployeeId,
        /// The salary month queried.
        salary_month: SalaryMonth,
    },

    /// The attendance summary holds an unusable value.
    #[error("Invalid attendance data for employee {employee_id}: {message}")]
    InvalidAttendance {
        /// The employee.
        employee_id: EmployeeId,
        /// What is wrong with the summary.
        message: String,
    },

    /// A pay component master record cannot be applied.
    #[error("Invalid pay component '{code}': {message}")]
    InvalidPayComponent {
        /// The component code.
        code: String,
        /// What is wrong with it.
        message: String,
    },

    /// Total deductions exceed gross pay.
    #[error(
        "Net pay would be negative ({net_pay}) for employee {employee_id}; clamped to 0 for manual review"
    )]
    NegativeNetPay {
        /// The employee.
        employee_id: EmployeeId,
        /// The unclamped net pay.
        net_pay: Decimal,
    },

    /// A single employee's calculation exceeded the configured time limit.
    #[error("Calculation for employee {employee_id} timed out after {timeout_ms}ms")]
    CalculationTimeout {
        /// The employee.
        employee_id: EmployeeId,
        /// The configured limit.
        timeout_ms: u64,
    },

    /// A single employee's calculation stopped without producing a result.
    #[error("Calculation for employee {employee_id} aborted unexpectedly")]
    CalculationAborted {
        /// The employee.
        employee_id: EmployeeId,
    },

    /// A backing store or collaborator failed.
    #[error("Data source error: {message}")]
    DataSource {
        /// A description of the failure.
        message: String,
    },
}

impl EngineError {
    /// Returns true for lifecycle and uniqueness violations that are reported
    /// synchronously to the operator or scheduler.
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidTransition { .. }
                | EngineError::DuplicateBatch { .. }
                | EngineError::BatchLocked { .. }
                | EngineError::EmptyBatch { .. }
                | EngineError::FailedResultsPresent { .. }
        )
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
