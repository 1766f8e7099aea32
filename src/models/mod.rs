//! Core data models for the Payroll Batch Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod adjustment;
mod attendance;
mod batch;
mod employee_result;
mod pay_component;
mod payment;
mod salary_month;

/// Identifier of an employee in the employee directory.
pub type EmployeeId = u64;

pub use adjustment::{
    AdjustmentId, AdjustmentSign, ApprovalStatus, PayrollAdjustment, PayrollRaise, RaiseId,
};
pub use attendance::AttendanceSummary;
pub use batch::{BatchAction, BatchId, BatchStatus, PayrollBatch};
pub use employee_result::{
    AuditStep, CalculationStatus, EmployeeCalculation, PayItem, PayItemKind,
    PayrollEmployeeResult, ResultId,
};
pub use pay_component::{
    AllowanceDefinition, DeductionCalculation, DeductionDefinition, DeductionType, RateBasis,
};
pub use payment::{PaymentHistory, PaymentId, PaymentMethod};
pub use salary_month::SalaryMonth;
