//! Configuration types for the payroll engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{AllowanceDefinition, DeductionDefinition};

/// How the overtime hourly rate is obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HourlyRate {
    /// A single configured hourly rate for everyone.
    Fixed {
        /// Currency units per hour.
        amount: Decimal,
    },
    /// Effective base salary divided by the standard monthly hours,
    /// truncated to a whole currency unit.
    DerivedFromBase {
        /// Hours in a standard working month (209 under a 40-hour week).
        standard_monthly_hours: Decimal,
    },
}

fn default_multiplier() -> Decimal {
    Decimal::new(15, 1)
}

/// Overtime pay policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeConfig {
    /// Where the hourly rate comes from.
    pub hourly_rate: HourlyRate,
    /// Premium applied to the hourly rate.
    #[serde(default = "default_multiplier")]
    pub multiplier: Decimal,
}

impl Default for OvertimeConfig {
    fn default() -> Self {
        Self {
            hourly_rate: HourlyRate::DerivedFromBase {
                standard_monthly_hours: Decimal::from(209),
            },
            multiplier: default_multiplier(),
        }
    }
}

/// Batch processing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum number of employee calculations in flight.
    pub worker_concurrency: usize,
    /// Time limit for one employee's calculation.
    pub employee_timeout_ms: u64,
    /// Refuse to confirm a batch that still has FAILED results.
    pub block_confirm_on_failures: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            worker_concurrency: 8,
            employee_timeout_ms: 30_000,
            block_confirm_on_failures: false,
        }
    }
}

/// Scheduler trigger settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Whether the periodic trigger should run.
    pub enabled: bool,
    /// Seconds between triggers.
    pub interval_secs: u64,
    /// Target month relative to the trigger date (-1 runs last month).
    pub month_offset: i32,
    /// Calculate the batch after ensuring it exists.
    pub auto_calculate: bool,
    /// Recalculate a batch that is already CALCULATED.
    pub recalculate: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 86_400,
            month_offset: 0,
            auto_calculate: true,
            recalculate: false,
        }
    }
}

/// Contents of `payroll.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollConfig {
    /// Overtime policy.
    #[serde(default)]
    pub overtime: OvertimeConfig,
    /// Batch processing settings.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Scheduler settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Contents of `components.yaml`: the allowance and deduction master list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentsConfig {
    /// Allowance master records.
    #[serde(default)]
    pub allowances: Vec<AllowanceDefinition>,
    /// Deduction master records.
    #[serde(default)]
    pub deductions: Vec<DeductionDefinition>,
}

/// The complete engine configuration loaded from YAML files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    payroll: PayrollConfig,
    components: ComponentsConfig,
}

impl EngineConfig {
    /// Creates a new EngineConfig from its component parts.
    pub fn new(payroll: PayrollConfig, components: ComponentsConfig) -> Self {
        Self {
            payroll,
            components,
        }
    }

    /// Returns the payroll settings.
    pub fn payroll(&self) -> &PayrollConfig {
        &self.payroll
    }

    /// Returns the component master list.
    pub fn components(&self) -> &ComponentsConfig {
        &self.components
    }
}
