//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading payroll
//! configuration from YAML files.

use rust_decimal::Decimal;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::{AllowanceDefinition, DeductionCalculation, DeductionDefinition};

use super::types::{ComponentsConfig, EngineConfig, HourlyRate, PayrollConfig};

/// Largest accepted `scheduler.month_offset`, in either direction.
pub const MAX_MONTH_OFFSET: i32 = 120;

/// Loads, validates and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/payroll/
/// ├── payroll.yaml     # Overtime policy, batch and scheduler settings
/// └── components.yaml  # Allowance and deduction master list
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/payroll")?;
/// println!("Workers: {}", loader.payroll().batch.worker_concurrency);
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if a file is missing (`ConfigNotFound`), is not valid
    /// YAML for its schema (`ConfigParseError`), or holds an unusable value
    /// (`InvalidConfig`).
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let payroll = Self::load_yaml::<PayrollConfig>(&path.join("payroll.yaml"))?;
        let components = Self::load_yaml::<ComponentsConfig>(&path.join("components.yaml"))?;

        Self::from_parts(payroll, components)
    }

    /// Builds a loader from in-memory configuration, applying the same
    /// validation as [`ConfigLoader::load`].
    pub fn from_parts(payroll: PayrollConfig, components: ComponentsConfig) -> EngineResult<Self> {
        validate_payroll(&payroll)?;
        validate_components(&components)?;
        Ok(Self {
            config: EngineConfig::new(payroll, components),
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the payroll settings.
    pub fn payroll(&self) -> &PayrollConfig {
        self.config.payroll()
    }

    /// Returns the allowance and deduction master list.
    pub fn components(&self) -> &ComponentsConfig {
        self.config.components()
    }

    /// Gets an allowance definition by code.
    pub fn allowance(&self, code: &str) -> Option<&AllowanceDefinition> {
        self.components().allowances.iter().find(|a| a.code == code)
    }

    /// Gets a deduction definition by code.
    pub fn deduction(&self, code: &str) -> Option<&DeductionDefinition> {
        self.components().deductions.iter().find(|d| d.code == code)
    }
}

fn invalid(field: &str, message: impl Into<String>) -> EngineError {
    EngineError::InvalidConfig {
        field: field.to_string(),
        message: message.into(),
    }
}

fn validate_payroll(payroll: &PayrollConfig) -> EngineResult<()> {
    match &payroll.overtime.hourly_rate {
        HourlyRate::Fixed { amount } if amount.is_sign_negative() => {
            return Err(invalid("overtime.hourly_rate.amount", "must not be negative"));
        }
        HourlyRate::DerivedFromBase {
            standard_monthly_hours,
        } if *standard_monthly_hours <= Decimal::ZERO => {
            return Err(invalid(
                "overtime.hourly_rate.standard_monthly_hours",
                "must be positive",
            ));
        }
        _ => {}
    }

    if payroll.overtime.multiplier.is_sign_negative() {
        return Err(invalid("overtime.multiplier", "must not be negative"));
    }
    if payroll.batch.worker_concurrency == 0 {
        return Err(invalid("batch.worker_concurrency", "must be at least 1"));
    }
    if payroll.batch.employee_timeout_ms == 0 {
        return Err(invalid("batch.employee_timeout_ms", "must be at least 1"));
    }
    if payroll.scheduler.enabled && payroll.scheduler.interval_secs == 0 {
        return Err(invalid("scheduler.interval_secs", "must be at least 1"));
    }
    if !(-MAX_MONTH_OFFSET..=MAX_MONTH_OFFSET).contains(&payroll.scheduler.month_offset) {
        return Err(invalid(
            "scheduler.month_offset",
            format!("must be within ±{MAX_MONTH_OFFSET} months"),
        ));
    }
    Ok(())
}

fn validate_components(components: &ComponentsConfig) -> EngineResult<()> {
    let mut seen = HashSet::new();
    for allowance in &components.allowances {
        if !seen.insert(allowance.code.as_str()) {
            return Err(invalid(
                "allowances.code",
                format!("duplicate code {}", allowance.code),
            ));
        }
        if allowance.default_amount.is_sign_negative() {
            return Err(invalid(
                "allowances.default_amount",
                format!("{} must not be negative", allowance.code),
            ));
        }
    }

    let mut seen = HashSet::new();
    for deduction in &components.deductions {
        if !seen.insert(deduction.code.as_str()) {
            return Err(invalid(
                "deductions.code",
                format!("duplicate code {}", deduction.code),
            ));
        }
        match &deduction.calculation {
            DeductionCalculation::Fixed { amount } if amount.is_sign_negative() => {
                return Err(invalid(
                    "deductions.calculation.amount",
                    format!("{} must not be negative", deduction.code),
                ));
            }
            DeductionCalculation::Rate { percent, .. }
                if *percent < Decimal::ZERO || *percent > Decimal::from(100) =>
            {
                return Err(invalid(
                    "deductions.calculation.percent",
                    format!("{} must be between 0 and 100", deduction.code),
                ));
            }
            _ => {}
        }
    }
    Ok(())
}
