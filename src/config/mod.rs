//! Configuration loading and management for the Payroll Batch Engine.
//!
//! This module loads the overtime policy, batch and scheduler settings, and
//! the allowance/deduction master list from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/payroll").unwrap();
//! println!("Allowances: {}", config.components().allowances.len());
//! ```

mod loader;
mod types;

pub use loader::{ConfigLoader, MAX_MONTH_OFFSET};
pub use types::{
    BatchConfig, ComponentsConfig, EngineConfig, HourlyRate, OvertimeConfig, PayrollConfig,
    SchedulerConfig,
};
