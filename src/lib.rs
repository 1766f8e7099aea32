//! Payroll Batch Engine
//!
//! This crate runs a company's monthly payroll: it aggregates base salaries,
//! approved raises, manual adjustments, allowances, deductions and
//! attendance-derived overtime into per-employee net pay, and drives each
//! month's batch through the READY → CALCULATED → CONFIRMED → PAID lifecycle
//! so that confirmed numbers cannot change and nothing is paid twice.
//!
//! Persistence and upstream data sources are traits in [`store`] with
//! in-memory implementations.

#![warn(missing_docs)]

pub mod batch;
pub mod calculation;
pub mod components;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod scheduler;
pub mod store;
