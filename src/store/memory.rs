//! In-memory implementations of the store traits.
//!
//! All stores are backed by [`DashMap`] so concurrent calculation workers can
//! read collaborators and write their own results without a global lock.
//! Identifiers are handed out from atomic counters starting at 1, which keeps
//! "higher id = created later" true for raise selection.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;

use super::{
    ApprovalStore, AttendanceSummaryProvider, BatchFilter, EmployeeDirectory, PayComponentStore,
    PaymentRecord, PayrollRepository,
};
use crate::config::ComponentsConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AdjustmentId, AllowanceDefinition, ApprovalStatus, AttendanceSummary, BatchId,
    DeductionDefinition, EmployeeCalculation, EmployeeId, PaymentHistory, PaymentMethod,
    PayrollAdjustment, PayrollBatch, PayrollEmployeeResult, PayrollRaise, RaiseId, ResultId,
    SalaryMonth,
};

fn next_id(counter: &AtomicU64) -> u64 {
    counter.fetch_add(1, Ordering::SeqCst) + 1
}

// =============================================================================
// Employee directory
// =============================================================================

#[derive(Debug, Clone)]
struct DirectoryEntry {
    base_salary: Decimal,
    batch_target: bool,
}

/// Employee directory held in memory.
#[derive(Debug, Default)]
pub struct InMemoryEmployeeDirectory {
    employees: DashMap<EmployeeId, DirectoryEntry>,
}

impl InMemoryEmployeeDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an employee who is a batch target.
    pub fn insert(&self, employee_id: EmployeeId, base_salary: Decimal) {
        self.employees.insert(
            employee_id,
            DirectoryEntry {
                base_salary,
                batch_target: true,
            },
        );
    }

    /// Includes or excludes an employee from default batch targets
    /// (e.g. on leave or terminated).
    pub fn set_batch_target(&self, employee_id: EmployeeId, batch_target: bool) -> EngineResult<()> {
        let mut entry = self
            .employees
            .get_mut(&employee_id)
            .ok_or(EngineError::EmployeeNotFound { employee_id })?;
        entry.batch_target = batch_target;
        Ok(())
    }

    /// Replaces an employee's stored base salary.
    pub fn set_base_salary(&self, employee_id: EmployeeId, base_salary: Decimal) -> EngineResult<()> {
        let mut entry = self
            .employees
            .get_mut(&employee_id)
            .ok_or(EngineError::EmployeeNotFound { employee_id })?;
        entry.base_salary = base_salary;
        Ok(())
    }
}

#[async_trait]
impl EmployeeDirectory for InMemoryEmployeeDirectory {
    async fn base_salary(&self, employee_id: EmployeeId) -> EngineResult<Decimal> {
        self.employees
            .get(&employee_id)
            .map(|entry| entry.base_salary)
            .ok_or(EngineError::EmployeeNotFound { employee_id })
    }

    async fn list_batch_target_employees(&self) -> EngineResult<Vec<EmployeeId>> {
        let mut ids: Vec<EmployeeId> = self
            .employees
            .iter()
            .filter(|entry| entry.batch_target)
            .map(|entry| *entry.key())
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

// =============================================================================
// Attendance
// =============================================================================

/// Attendance summaries held in memory.
#[derive(Debug, Default)]
pub struct InMemoryAttendanceProvider {
    summaries: DashMap<(EmployeeId, SalaryMonth), AttendanceSummary>,
}

impl InMemoryAttendanceProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the summary for an employee and month.
    pub fn insert(&self, employee_id: EmployeeId, month: SalaryMonth, summary: AttendanceSummary) {
        self.summaries.insert((employee_id, month), summary);
    }

    /// Removes the summary for an employee and month.
    pub fn remove(&self, employee_id: EmployeeId, month: SalaryMonth) {
        self.summaries.remove(&(employee_id, month));
    }
}

#[async_trait]
impl AttendanceSummaryProvider for InMemoryAttendanceProvider {
    async fn summary(
        &self,
        employee_id: EmployeeId,
        salary_month: SalaryMonth,
    ) -> EngineResult<Option<AttendanceSummary>> {
        Ok(self
            .summaries
            .get(&(employee_id, salary_month))
            .map(|s| s.clone()))
    }
}

// =============================================================================
// Approval records
// =============================================================================

/// Adjustment and raise records held in memory.
///
/// `record_*` methods assign the id, ignoring whatever the caller supplied.
#[derive(Debug, Default)]
pub struct InMemoryApprovalStore {
    adjustments: DashMap<AdjustmentId, PayrollAdjustment>,
    raises: DashMap<RaiseId, PayrollRaise>,
    adjustment_seq: AtomicU64,
    raise_seq: AtomicU64,
}

impl InMemoryApprovalStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an adjustment and returns its new id.
    pub fn record_adjustment(&self, mut adjustment: PayrollAdjustment) -> AdjustmentId {
        adjustment.id = next_id(&self.adjustment_seq);
        let id = adjustment.id;
        self.adjustments.insert(id, adjustment);
        id
    }

    /// Stores a raise and returns its new id.
    pub fn record_raise(&self, mut raise: PayrollRaise) -> RaiseId {
        raise.id = next_id(&self.raise_seq);
        let id = raise.id;
        self.raises.insert(id, raise);
        id
    }

    /// Moves an adjustment to a new approval state.
    pub fn set_adjustment_status(&self, id: AdjustmentId, status: ApprovalStatus) -> EngineResult<()> {
        let mut adjustment = self.adjustments.get_mut(&id).ok_or_else(|| EngineError::DataSource {
            message: format!("adjustment {id} not found"),
        })?;
        adjustment.status = status;
        Ok(())
    }

    /// Moves a raise to a new approval state.
    pub fn set_raise_status(&self, id: RaiseId, status: ApprovalStatus) -> EngineResult<()> {
        let mut raise = self.raises.get_mut(&id).ok_or_else(|| EngineError::DataSource {
            message: format!("raise {id} not found"),
        })?;
        raise.status = status;
        Ok(())
    }
}

#[async_trait]
impl ApprovalStore for InMemoryApprovalStore {
    async fn adjustments(
        &self,
        employee_id: EmployeeId,
        salary_month: SalaryMonth,
    ) -> EngineResult<Vec<PayrollAdjustment>> {
        let mut found: Vec<PayrollAdjustment> = self
            .adjustments
            .iter()
            .filter(|a| a.employee_id == employee_id && a.effective_month == salary_month)
            .map(|a| a.value().clone())
            .collect();
        found.sort_by_key(|a| a.id);
        Ok(found)
    }

    async fn raises(
        &self,
        employee_id: EmployeeId,
        salary_month: SalaryMonth,
    ) -> EngineResult<Vec<PayrollRaise>> {
        let mut found: Vec<PayrollRaise> = self
            .raises
            .iter()
            .filter(|r| r.employee_id == employee_id && r.effective_month == salary_month)
            .map(|r| r.value().clone())
            .collect();
        found.sort_by_key(|r| r.id);
        Ok(found)
    }
}

// =============================================================================
// Pay component master
// =============================================================================

/// Allowance/deduction master list held in memory, keyed by code.
#[derive(Debug, Default)]
pub struct InMemoryPayComponentStore {
    allowances: DashMap<String, AllowanceDefinition>,
    deductions: DashMap<String, DeductionDefinition>,
}

impl InMemoryPayComponentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store from the configured master list.
    pub fn from_config(components: &ComponentsConfig) -> Self {
        let store = Self::new();
        for allowance in &components.allowances {
            store.upsert_allowance(allowance.clone());
        }
        for deduction in &components.deductions {
            store.upsert_deduction(deduction.clone());
        }
        store
    }

    /// Inserts or replaces an allowance definition.
    pub fn upsert_allowance(&self, allowance: AllowanceDefinition) {
        self.allowances.insert(allowance.code.clone(), allowance);
    }

    /// Inserts or replaces a deduction definition.
    pub fn upsert_deduction(&self, deduction: DeductionDefinition) {
        self.deductions.insert(deduction.code.clone(), deduction);
    }

    /// Activates or deactivates an allowance. Returns false for an unknown code.
    pub fn set_allowance_active(&self, code: &str, active: bool) -> bool {
        match self.allowances.get_mut(code) {
            Some(mut allowance) => {
                allowance.active = active;
                true
            }
            None => false,
        }
    }

    /// Activates or deactivates a deduction. Returns false for an unknown code.
    pub fn set_deduction_active(&self, code: &str, active: bool) -> bool {
        match self.deductions.get_mut(code) {
            Some(mut deduction) => {
                deduction.active = active;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl PayComponentStore for InMemoryPayComponentStore {
    async fn list_active_allowances(&self) -> EngineResult<Vec<AllowanceDefinition>> {
        let mut active: Vec<AllowanceDefinition> = self
            .allowances
            .iter()
            .filter(|a| a.active)
            .map(|a| a.value().clone())
            .collect();
        active.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(active)
    }

    async fn list_active_deductions(&self) -> EngineResult<Vec<DeductionDefinition>> {
        let mut active: Vec<DeductionDefinition> = self
            .deductions
            .iter()
            .filter(|d| d.active)
            .map(|d| d.value().clone())
            .collect();
        active.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(active)
    }
}

// =============================================================================
// Payroll repository
// =============================================================================

/// Batches, results and payments held in memory.
///
/// Month uniqueness and payment idempotency are enforced with map entries,
/// so they hold even under concurrent callers.
#[derive(Debug, Default)]
pub struct InMemoryPayrollRepository {
    batches: DashMap<BatchId, PayrollBatch>,
    months: DashMap<SalaryMonth, BatchId>,
    results: DashMap<(BatchId, EmployeeId), PayrollEmployeeResult>,
    payments: DashMap<ResultId, PaymentHistory>,
    batch_seq: AtomicU64,
    result_seq: AtomicU64,
    payment_seq: AtomicU64,
}

impl InMemoryPayrollRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PayrollRepository for InMemoryPayrollRepository {
    async fn insert_batch(
        &self,
        salary_month: SalaryMonth,
        now: DateTime<Utc>,
    ) -> EngineResult<PayrollBatch> {
        match self.months.entry(salary_month) {
            Entry::Occupied(_) => Err(EngineError::DuplicateBatch { salary_month }),
            Entry::Vacant(slot) => {
                let batch = PayrollBatch::new(next_id(&self.batch_seq), salary_month, now);
                self.batches.insert(batch.id, batch.clone());
                slot.insert(batch.id);
                Ok(batch)
            }
        }
    }

    async fn find_batch(&self, batch_id: BatchId) -> EngineResult<Option<PayrollBatch>> {
        Ok(self.batches.get(&batch_id).map(|b| b.clone()))
    }

    async fn find_batch_by_month(
        &self,
        salary_month: SalaryMonth,
    ) -> EngineResult<Option<PayrollBatch>> {
        let Some(batch_id) = self.months.get(&salary_month).map(|id| *id) else {
            return Ok(None);
        };
        self.find_batch(batch_id).await
    }

    async fn update_batch(&self, batch: &PayrollBatch) -> EngineResult<()> {
        let mut stored = self
            .batches
            .get_mut(&batch.id)
            .ok_or(EngineError::BatchNotFound { batch_id: batch.id })?;
        *stored = batch.clone();
        Ok(())
    }

    async fn list_batches(&self, filter: &BatchFilter) -> EngineResult<Vec<PayrollBatch>> {
        let mut batches: Vec<PayrollBatch> = self
            .batches
            .iter()
            .filter(|b| filter.matches(b.value()))
            .map(|b| b.value().clone())
            .collect();
        batches.sort_by(|a, b| b.salary_month.cmp(&a.salary_month));
        Ok(batches)
    }

    async fn save_result(
        &self,
        batch_id: BatchId,
        calculation: EmployeeCalculation,
        now: DateTime<Utc>,
    ) -> EngineResult<PayrollEmployeeResult> {
        if !self.batches.contains_key(&batch_id) {
            return Err(EngineError::BatchNotFound { batch_id });
        }

        let key = (batch_id, calculation.employee_id);
        let result = match self.results.entry(key) {
            Entry::Occupied(mut slot) => {
                let result = PayrollEmployeeResult {
                    id: slot.get().id,
                    batch_id,
                    calculated_at: now,
                    calculation,
                };
                slot.insert(result.clone());
                result
            }
            Entry::Vacant(slot) => {
                let result = PayrollEmployeeResult {
                    id: next_id(&self.result_seq),
                    batch_id,
                    calculated_at: now,
                    calculation,
                };
                slot.insert(result.clone());
                result
            }
        };
        Ok(result)
    }

    async fn results_for_batch(
        &self,
        batch_id: BatchId,
    ) -> EngineResult<Vec<PayrollEmployeeResult>> {
        let mut results: Vec<PayrollEmployeeResult> = self
            .results
            .iter()
            .filter(|r| r.key().0 == batch_id)
            .map(|r| r.value().clone())
            .collect();
        results.sort_by_key(|r| r.employee_id());
        Ok(results)
    }

    async fn remove_results_except(
        &self,
        batch_id: BatchId,
        keep: &BTreeSet<EmployeeId>,
    ) -> EngineResult<usize> {
        let stale: Vec<(BatchId, EmployeeId)> = self
            .results
            .iter()
            .map(|r| *r.key())
            .filter(|(batch, employee)| *batch == batch_id && !keep.contains(employee))
            .collect();
        for key in &stale {
            self.results.remove(key);
        }
        Ok(stale.len())
    }

    async fn record_payment(
        &self,
        result: &PayrollEmployeeResult,
        paid_at: DateTime<Utc>,
    ) -> EngineResult<PaymentRecord> {
        match self.payments.entry(result.id) {
            Entry::Occupied(existing) => Ok(PaymentRecord {
                history: existing.get().clone(),
                created: false,
            }),
            Entry::Vacant(slot) => {
                let history = PaymentHistory {
                    id: next_id(&self.payment_seq),
                    payroll_result_id: result.id,
                    batch_id: result.batch_id,
                    employee_id: result.employee_id(),
                    amount: result.calculation.net_pay,
                    method: PaymentMethod::BankTransfer,
                    paid_at,
                };
                slot.insert(history.clone());
                Ok(PaymentRecord {
                    history,
                    created: true,
                })
            }
        }
    }

    async fn payments_for_batch(&self, batch_id: BatchId) -> EngineResult<Vec<PaymentHistory>> {
        let mut payments: Vec<PaymentHistory> = self
            .payments
            .iter()
            .filter(|p| p.batch_id == batch_id)
            .map(|p| p.value().clone())
            .collect();
        payments.sort_by_key(|p| p.id);
        Ok(payments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdjustmentSign, BatchStatus};
    use std::str::FromStr;

    fn month(s: &str) -> SalaryMonth {
        SalaryMonth::from_str(s).unwrap()
    }

    fn success(employee_id: EmployeeId, net: i64) -> EmployeeCalculation {
        let mut calc = EmployeeCalculation::failed(employee_id, month("2026-01"), "", vec![]);
        calc.status = crate::models::CalculationStatus::Success;
        calc.failure_reason = None;
        calc.net_pay = Decimal::from(net);
        calc
    }

    #[tokio::test]
    async fn test_insert_batch_rejects_duplicate_month() {
        let repo = InMemoryPayrollRepository::new();
        let first = repo.insert_batch(month("2026-01"), Utc::now()).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(first.status, BatchStatus::Ready);

        match repo.insert_batch(month("2026-01"), Utc::now()).await {
            Err(EngineError::DuplicateBatch { salary_month }) => {
                assert_eq!(salary_month, month("2026-01"))
            }
            other => panic!("Expected DuplicateBatch, got {:?}", other),
        }

        let second = repo.insert_batch(month("2026-02"), Utc::now()).await.unwrap();
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_find_batch_by_month() {
        let repo = InMemoryPayrollRepository::new();
        let batch = repo.insert_batch(month("2026-03"), Utc::now()).await.unwrap();

        let found = repo.find_batch_by_month(month("2026-03")).await.unwrap();
        assert_eq!(found.map(|b| b.id), Some(batch.id));
        assert!(repo.find_batch_by_month(month("2026-04")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_result_keeps_id_on_overwrite() {
        let repo = InMemoryPayrollRepository::new();
        let batch = repo.insert_batch(month("2026-01"), Utc::now()).await.unwrap();

        let first = repo.save_result(batch.id, success(7, 100), Utc::now()).await.unwrap();
        let second = repo.save_result(batch.id, success(7, 250), Utc::now()).await.unwrap();

        assert_eq!(first.id, second.id);
        let stored = repo.results_for_batch(batch.id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].calculation.net_pay, Decimal::from(250));
    }

    #[tokio::test]
    async fn test_save_result_for_unknown_batch_fails() {
        let repo = InMemoryPayrollRepository::new();
        assert!(matches!(
            repo.save_result(99, success(1, 1), Utc::now()).await,
            Err(EngineError::BatchNotFound { batch_id: 99 })
        ));
    }

    #[tokio::test]
    async fn test_remove_results_except_only_touches_that_batch() {
        let repo = InMemoryPayrollRepository::new();
        let jan = repo.insert_batch(month("2026-01"), Utc::now()).await.unwrap();
        let feb = repo.insert_batch(month("2026-02"), Utc::now()).await.unwrap();
        for employee_id in 1..=3 {
            repo.save_result(jan.id, success(employee_id, 100), Utc::now()).await.unwrap();
            repo.save_result(feb.id, success(employee_id, 100), Utc::now()).await.unwrap();
        }

        let keep: BTreeSet<EmployeeId> = [1, 2].into_iter().collect();
        assert_eq!(repo.remove_results_except(jan.id, &keep).await.unwrap(), 1);
        assert_eq!(repo.remove_results_except(jan.id, &keep).await.unwrap(), 0);

        let remaining: Vec<EmployeeId> = repo
            .results_for_batch(jan.id)
            .await
            .unwrap()
            .iter()
            .map(|r| r.employee_id())
            .collect();
        assert_eq!(remaining, vec![1, 2]);
        assert_eq!(repo.results_for_batch(feb.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_record_payment_is_idempotent() {
        let repo = InMemoryPayrollRepository::new();
        let batch = repo.insert_batch(month("2026-01"), Utc::now()).await.unwrap();
        let result = repo.save_result(batch.id, success(7, 1000), Utc::now()).await.unwrap();

        let first = repo.record_payment(&result, Utc::now()).await.unwrap();
        let second = repo.record_payment(&result, Utc::now()).await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.history, second.history);
        assert_eq!(first.history.amount, Decimal::from(1000));
        assert_eq!(repo.payments_for_batch(batch.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_batches_filters_and_orders_newest_first() {
        let repo = InMemoryPayrollRepository::new();
        repo.insert_batch(month("2026-01"), Utc::now()).await.unwrap();
        let mut feb = repo.insert_batch(month("2026-02"), Utc::now()).await.unwrap();
        feb.mark_calculated(1, Utc::now()).unwrap();
        repo.update_batch(&feb).await.unwrap();

        let all = repo.list_batches(&BatchFilter::default()).await.unwrap();
        assert_eq!(
            all.iter().map(|b| b.salary_month).collect::<Vec<_>>(),
            vec![month("2026-02"), month("2026-01")]
        );

        let calculated = repo
            .list_batches(&BatchFilter {
                status: Some(BatchStatus::Calculated),
                ..BatchFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(calculated.len(), 1);
        assert_eq!(calculated[0].id, feb.id);
    }

    #[tokio::test]
    async fn test_directory_lists_targets_in_id_order() {
        let directory = InMemoryEmployeeDirectory::new();
        directory.insert(3, Decimal::from(100));
        directory.insert(1, Decimal::from(100));
        directory.insert(2, Decimal::from(100));
        directory.set_batch_target(2, false).unwrap();

        assert_eq!(directory.list_batch_target_employees().await.unwrap(), vec![1, 3]);
        assert!(matches!(
            directory.base_salary(9).await,
            Err(EngineError::EmployeeNotFound { employee_id: 9 })
        ));
    }

    #[tokio::test]
    async fn test_approval_store_assigns_increasing_ids() {
        let store = InMemoryApprovalStore::new();
        let template = PayrollAdjustment {
            id: 0,
            employee_id: 1,
            sign: AdjustmentSign::Plus,
            amount: Decimal::from(10),
            reason: "x".to_string(),
            effective_month: month("2026-01"),
            status: ApprovalStatus::Pending,
        };
        let a = store.record_adjustment(template.clone());
        let b = store.record_adjustment(template);
        assert!(b > a);

        store.set_adjustment_status(b, ApprovalStatus::Approved).unwrap();
        let found = store.adjustments(1, month("2026-01")).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].status, ApprovalStatus::Approved);
        assert!(store.set_adjustment_status(99, ApprovalStatus::Approved).is_err());
    }

    #[tokio::test]
    async fn test_component_store_lists_only_active() {
        let loader = crate::config::ConfigLoader::load("./config/payroll").unwrap();
        let store = InMemoryPayComponentStore::from_config(loader.components());

        let allowances = store.list_active_allowances().await.unwrap();
        assert!(allowances.iter().all(|a| a.active));
        assert!(!allowances.iter().any(|a| a.code == "NIGHT"));

        assert!(store.set_allowance_active("NIGHT", true));
        let allowances = store.list_active_allowances().await.unwrap();
        assert!(allowances.iter().any(|a| a.code == "NIGHT"));

        assert!(!store.set_deduction_active("NOPE", true));
    }
}
