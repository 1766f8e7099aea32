//! Payroll batch orchestration.
//!
//! [`PayrollBatchService`] owns the lifecycle of a month's payroll run:
//! creation, the concurrent calculation fan-out, confirmation, payment, and
//! the read-only views over batches and their results.

mod query;
mod service;

pub use query::{BatchDetail, BatchSummary};
pub use service::{CalculationRun, PaymentRun, PayrollBatchService};
