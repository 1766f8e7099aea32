//! Batch orchestration: lifecycle transitions, calculation runs and payment.

use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::DashMap;
use futures::FutureExt;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use super::query::{BatchDetail, BatchSummary};
use crate::calculation::PayrollCalculator;
use crate::config::BatchConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    BatchId, BatchStatus, EmployeeCalculation, EmployeeId, PaymentHistory, PayrollBatch,
    PayrollEmployeeResult, SalaryMonth,
};
use crate::store::{BatchFilter, EmployeeDirectory, PayrollRepository};

/// Outcome of one calculation run over a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculationRun {
    /// Correlation id of the run, also present in its log events.
    pub run_id: Uuid,
    /// The batch calculated.
    pub batch_id: BatchId,
    /// The batch's salary month.
    pub salary_month: SalaryMonth,
    /// Number of employees calculated.
    pub total: usize,
    /// Results with status SUCCESS.
    pub succeeded: usize,
    /// Results with status FAILED.
    pub failed: usize,
    /// Employees whose result is FAILED, in id order.
    pub failed_employees: Vec<EmployeeId>,
    /// Batch status after the run.
    pub status: BatchStatus,
}

/// Outcome of paying a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRun {
    /// The batch, now PAID.
    pub batch: PayrollBatch,
    /// Payment records written by this call.
    pub payments_created: usize,
    /// SUCCESS results that already had a payment record.
    pub already_paid: usize,
    /// FAILED results, which are never paid.
    pub not_payable: usize,
}

/// Drives payroll batches through their lifecycle.
///
/// Every status change and every calculation run on a batch happens under
/// that batch's mutex, so concurrent callers cannot advance the same batch
/// twice or recalculate it while it is being confirmed. Different batches do
/// not contend.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use payroll_engine::batch::PayrollBatchService;
/// use payroll_engine::calculation::PayrollCalculator;
/// use payroll_engine::components::PayComponentResolver;
/// use payroll_engine::config::ConfigLoader;
/// use payroll_engine::ledger::AdjustmentLedger;
/// use payroll_engine::store::*;
///
/// # async fn run() -> payroll_engine::error::EngineResult<()> {
/// let config = ConfigLoader::load("./config/payroll")?;
/// let directory = Arc::new(InMemoryEmployeeDirectory::new());
/// let calculator = PayrollCalculator::new(
///     directory.clone(),
///     Arc::new(InMemoryAttendanceProvider::new()),
///     AdjustmentLedger::new(Arc::new(InMemoryApprovalStore::new())),
///     PayComponentResolver::new(Arc::new(InMemoryPayComponentStore::from_config(config.components()))),
///     config.payroll().overtime.clone(),
/// );
/// let service = PayrollBatchService::new(
///     Arc::new(InMemoryPayrollRepository::new()),
///     calculator,
///     directory,
///     config.payroll().batch.clone(),
/// );
///
/// let batch = service.create_batch("2026-01".parse()?).await?;
/// service.calculate(batch.id, None).await?;
/// service.confirm(batch.id).await?;
/// service.mark_paid(batch.id).await?;
/// # Ok(())
/// # }
/// ```
pub struct PayrollBatchService {
    repository: Arc<dyn PayrollRepository>,
    calculator: PayrollCalculator,
    directory: Arc<dyn EmployeeDirectory>,
    settings: BatchConfig,
    locks: DashMap<BatchId, Arc<Mutex<()>>>,
}

impl PayrollBatchService {
    /// Creates a service over the given repository and calculator.
    pub fn new(
        repository: Arc<dyn PayrollRepository>,
        calculator: PayrollCalculator,
        directory: Arc<dyn EmployeeDirectory>,
        settings: BatchConfig,
    ) -> Self {
        Self {
            repository,
            calculator,
            directory,
            settings,
            locks: DashMap::new(),
        }
    }

    /// Returns the batch settings in use.
    pub fn settings(&self) -> &BatchConfig {
        &self.settings
    }

    /// Returns the batch's mutex. Unknown and PAID batches get no entry;
    /// `mark_paid` removes the entry once the batch is PAID.
    async fn lock_for(&self, batch_id: BatchId) -> EngineResult<Arc<Mutex<()>>> {
        if let Some(lock) = self.locks.get(&batch_id) {
            return Ok(lock.clone());
        }
        if self.load(batch_id).await?.status == BatchStatus::Paid {
            // Every operation on a PAID batch is rejected, so it needs no shared lock.
            return Ok(Arc::default());
        }
        Ok(self.locks.entry(batch_id).or_default().clone())
    }

    async fn load(&self, batch_id: BatchId) -> EngineResult<PayrollBatch> {
        self.repository
            .find_batch(batch_id)
            .await?
            .ok_or(EngineError::BatchNotFound { batch_id })
    }

    /// Creates a READY batch for the month.
    ///
    /// Fails with `DuplicateBatch` if the month already has one.
    pub async fn create_batch(&self, salary_month: SalaryMonth) -> EngineResult<PayrollBatch> {
        let batch = self
            .repository
            .insert_batch(salary_month, Utc::now())
            .await
            .inspect_err(|err| {
                warn!(salary_month = %salary_month, error = %err, "Batch creation rejected")
            })?;
        info!(batch_id = batch.id, salary_month = %salary_month, "Payroll batch created");
        Ok(batch)
    }

    /// Returns the month's batch, creating it if absent. The flag is true
    /// when this call created it.
    pub async fn ensure_batch(&self, salary_month: SalaryMonth) -> EngineResult<(PayrollBatch, bool)> {
        if let Some(batch) = self.repository.find_batch_by_month(salary_month).await? {
            return Ok((batch, false));
        }
        match self.create_batch(salary_month).await {
            Ok(batch) => Ok((batch, true)),
            // Lost a creation race; the other caller's batch is the month's batch.
            Err(EngineError::DuplicateBatch { .. }) => self
                .repository
                .find_batch_by_month(salary_month)
                .await?
                .map(|batch| (batch, false))
                .ok_or(EngineError::DataSource {
                    message: format!("batch for {salary_month} vanished after creation"),
                }),
            Err(err) => Err(err),
        }
    }

    /// Calculates every target employee and records their results.
    ///
    /// Targets default to the directory's batch target list, and such a full
    /// run also drops results for employees no longer on it. An explicit
    /// list only recalculates those employees. A READY batch
    /// moves to CALCULATED; a CALCULATED batch stays CALCULATED with its
    /// results overwritten. Employee failures are recorded as FAILED results
    /// and never fail the run.
    ///
    /// # Errors
    ///
    /// - `BatchNotFound` for an unknown batch
    /// - `BatchLocked` once the batch is CONFIRMED or PAID
    /// - `EmptyBatch` when there is no one to calculate
    pub async fn calculate(
        &self,
        batch_id: BatchId,
        employees: Option<Vec<EmployeeId>>,
    ) -> EngineResult<CalculationRun> {
        let lock = self.lock_for(batch_id).await?;
        let _guard = lock.lock().await;

        let mut batch = self.load(batch_id).await?;
        batch.ensure_recalculable()?;

        let full_run = employees.is_none();
        let targets: BTreeSet<EmployeeId> = match employees {
            Some(ids) => ids.into_iter().collect(),
            None => self
                .directory
                .list_batch_target_employees()
                .await?
                .into_iter()
                .collect(),
        };
        if targets.is_empty() {
            return Err(EngineError::EmptyBatch { batch_id });
        }

        let run_id = Uuid::new_v4();
        let start_time = Instant::now();
        info!(
            run_id = %run_id,
            batch_id,
            salary_month = %batch.salary_month,
            employees = targets.len(),
            workers = self.settings.worker_concurrency,
            "Calculating payroll batch"
        );

        let salary_month = batch.salary_month;
        let outcomes: Vec<EngineResult<PayrollEmployeeResult>> = stream::iter(targets.iter().copied())
            .map(|employee_id| self.calculate_and_store(batch_id, salary_month, employee_id))
            .buffer_unordered(self.settings.worker_concurrency.max(1))
            .collect()
            .await;

        let mut stored = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            stored.push(outcome?);
        }
        let mut failed_employees: Vec<EmployeeId> = stored
            .iter()
            .filter(|r| !r.is_success())
            .map(|r| r.employee_id())
            .collect();
        failed_employees.sort_unstable();

        // A full run defines the batch's population; results for employees
        // no longer targeted must not be confirmed or paid.
        if full_run {
            let removed = self.repository.remove_results_except(batch_id, &targets).await?;
            if removed > 0 {
                info!(run_id = %run_id, batch_id, removed, "Removed results for untargeted employees");
            }
        }

        if batch.status == BatchStatus::Ready {
            let recorded = self.repository.results_for_batch(batch_id).await?.len();
            batch.mark_calculated(recorded, Utc::now())?;
            self.repository.update_batch(&batch).await?;
        }

        let run = CalculationRun {
            run_id,
            batch_id,
            salary_month,
            total: stored.len(),
            succeeded: stored.len() - failed_employees.len(),
            failed: failed_employees.len(),
            failed_employees,
            status: batch.status,
        };

        info!(
            run_id = %run_id,
            batch_id,
            salary_month = %salary_month,
            succeeded = run.succeeded,
            failed = run.failed,
            status = %run.status,
            duration_ms = start_time.elapsed().as_millis(),
            "Payroll batch calculated"
        );
        Ok(run)
    }

    async fn calculate_and_store(
        &self,
        batch_id: BatchId,
        salary_month: SalaryMonth,
        employee_id: EmployeeId,
    ) -> EngineResult<PayrollEmployeeResult> {
        let timeout_ms = self.settings.employee_timeout_ms;
        // All employees share one task, so a panic is contained here.
        let calculation = match tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            AssertUnwindSafe(self.calculator.calculate(employee_id, salary_month)).catch_unwind(),
        )
        .await
        {
            Ok(Ok(calculation)) => calculation,
            Ok(Err(_)) => {
                let error = EngineError::CalculationAborted { employee_id };
                warn!(batch_id, employee_id, error = %error, "Employee calculation aborted");
                EmployeeCalculation::failed(employee_id, salary_month, error.to_string(), Vec::new())
            }
            Err(_) => {
                let error = EngineError::CalculationTimeout {
                    employee_id,
                    timeout_ms,
                };
                warn!(batch_id, employee_id, error = %error, "Employee calculation timed out");
                EmployeeCalculation::failed(employee_id, salary_month, error.to_string(), Vec::new())
            }
        };
        self.repository
            .save_result(batch_id, calculation, Utc::now())
            .await
    }

    /// Locks a CALCULATED batch's numbers for payment.
    ///
    /// With `block_confirm_on_failures` set, a batch holding FAILED results
    /// is rejected with `FailedResultsPresent`.
    pub async fn confirm(&self, batch_id: BatchId) -> EngineResult<PayrollBatch> {
        let lock = self.lock_for(batch_id).await?;
        let _guard = lock.lock().await;

        let mut batch = self.load(batch_id).await?;
        batch.confirm(Utc::now()).inspect_err(|err| {
            warn!(batch_id, error = %err, "Batch confirmation rejected")
        })?;

        if self.settings.block_confirm_on_failures {
            let failed_count = self
                .repository
                .results_for_batch(batch_id)
                .await?
                .iter()
                .filter(|r| !r.is_success())
                .count();
            if failed_count > 0 {
                warn!(batch_id, failed_count, "Batch confirmation blocked by failed results");
                return Err(EngineError::FailedResultsPresent {
                    batch_id,
                    failed_count,
                });
            }
        }

        self.repository.update_batch(&batch).await?;
        info!(batch_id, salary_month = %batch.salary_month, "Payroll batch confirmed");
        Ok(batch)
    }

    /// Pays a CONFIRMED batch.
    ///
    /// Writes one payment record per SUCCESS result that does not have one
    /// yet, then marks the batch PAID. FAILED results are not paid.
    pub async fn mark_paid(&self, batch_id: BatchId) -> EngineResult<PaymentRun> {
        let lock = self.lock_for(batch_id).await?;
        let _guard = lock.lock().await;

        let mut batch = self.load(batch_id).await?;
        let now = Utc::now();
        batch.mark_paid(now).inspect_err(|err| {
            warn!(batch_id, error = %err, "Batch payment rejected")
        })?;

        let results = self.repository.results_for_batch(batch_id).await?;
        let mut payments_created = 0;
        let mut already_paid = 0;
        let mut not_payable = 0;
        // Payments are written before the status so a retry after a partial
        // failure finds the batch still CONFIRMED.
        for result in &results {
            if !result.is_success() {
                not_payable += 1;
                continue;
            }
            if self.repository.record_payment(result, now).await?.created {
                payments_created += 1;
            } else {
                already_paid += 1;
            }
        }
        self.repository.update_batch(&batch).await?;
        self.locks.remove(&batch_id);

        info!(
            batch_id,
            salary_month = %batch.salary_month,
            payments_created,
            already_paid,
            not_payable,
            "Payroll batch paid"
        );
        Ok(PaymentRun {
            batch,
            payments_created,
            already_paid,
            not_payable,
        })
    }

    /// Looks a batch up by id.
    pub async fn batch(&self, batch_id: BatchId) -> EngineResult<PayrollBatch> {
        self.load(batch_id).await
    }

    /// Looks a batch up by salary month.
    pub async fn batch_for_month(&self, salary_month: SalaryMonth) -> EngineResult<Option<PayrollBatch>> {
        self.repository.find_batch_by_month(salary_month).await
    }

    /// Lists batches passing the filter, newest month first, with totals.
    pub async fn list_batches(&self, filter: &BatchFilter) -> EngineResult<Vec<BatchSummary>> {
        let batches = self.repository.list_batches(filter).await?;
        let mut summaries = Vec::with_capacity(batches.len());
        for batch in batches {
            let results = self.repository.results_for_batch(batch.id).await?;
            summaries.push(BatchSummary::from_results(batch, &results));
        }
        Ok(summaries)
    }

    /// Returns a batch with its result and payment counts.
    pub async fn batch_detail(&self, batch_id: BatchId) -> EngineResult<BatchDetail> {
        let batch = self.load(batch_id).await?;
        let results = self.repository.results_for_batch(batch_id).await?;
        let payments = self.repository.payments_for_batch(batch_id).await?;
        Ok(BatchDetail::from_results(batch, &results, &payments))
    }

    /// Returns a batch's employee results, ordered by employee id.
    pub async fn employee_results(&self, batch_id: BatchId) -> EngineResult<Vec<PayrollEmployeeResult>> {
        self.load(batch_id).await?;
        self.repository.results_for_batch(batch_id).await
    }

    /// Returns a batch's payment history.
    pub async fn payments(&self, batch_id: BatchId) -> EngineResult<Vec<PaymentHistory>> {
        self.load(batch_id).await?;
        self.repository.payments_for_batch(batch_id).await
    }
}

impl std::fmt::Debug for PayrollBatchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayrollBatchService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
