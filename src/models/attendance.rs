//! Monthly attendance summary consumed by the calculation engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Worked time for one employee over one salary month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    /// Days with an attendance record.
    pub work_days: u32,
    /// Total hours worked.
    pub work_hours: Decimal,
    /// Hours beyond the standard schedule.
    pub overtime_hours: Decimal,
}
