//! Time-based payroll trigger.
//!
//! On every tick the scheduler makes sure the target month has a batch and,
//! if configured, calculates it. The target month is the trigger date's
//! month shifted by `scheduler.month_offset`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::batch::{CalculationRun, PayrollBatchService};
use crate::config::SchedulerConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{BatchStatus, PayrollBatch, SalaryMonth};

/// What one trigger did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledRun {
    /// The month targeted.
    pub salary_month: SalaryMonth,
    /// The month's batch after the trigger.
    pub batch: PayrollBatch,
    /// True if the trigger created the batch.
    pub created: bool,
    /// The calculation run, if one happened.
    pub calculation: Option<CalculationRun>,
}

/// Creates and calculates the current month's batch on a schedule.
#[derive(Debug)]
pub struct PayrollScheduler {
    service: Arc<PayrollBatchService>,
    settings: SchedulerConfig,
}

/// Handle to a spawned scheduler loop.
#[derive(Debug)]
pub struct SchedulerHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signals the loop to stop and waits for it to finish.
    pub async fn stop(self) {
        let _ = self.cancel.send(true);
        let _ = self.task.await;
    }
}

impl PayrollScheduler {
    /// Creates a scheduler driving the given service.
    pub fn new(service: Arc<PayrollBatchService>, settings: SchedulerConfig) -> Self {
        Self { service, settings }
    }

    /// The month a trigger at `now` targets.
    ///
    /// Fails with `InvalidConfig` if the offset leaves the calendar range.
    pub fn target_month(&self, now: DateTime<Utc>) -> EngineResult<SalaryMonth> {
        let month_offset = self.settings.month_offset;
        SalaryMonth::from_date(now.date_naive())
            .offset(month_offset)
            .ok_or_else(|| EngineError::InvalidConfig {
                field: "scheduler.month_offset".to_string(),
                message: format!("offset {month_offset} from {} is out of range", now.date_naive()),
            })
    }

    /// Runs one trigger.
    ///
    /// Creates the target month's batch if absent. With `auto_calculate`, a
    /// READY batch is calculated, and a CALCULATED batch is recalculated when
    /// `recalculate` is set. CONFIRMED and PAID batches are left alone.
    pub async fn trigger(&self, now: DateTime<Utc>) -> EngineResult<ScheduledRun> {
        let salary_month = self.target_month(now)?;
        let (batch, created) = self.service.ensure_batch(salary_month).await?;

        let should_calculate = self.settings.auto_calculate
            && match batch.status {
                BatchStatus::Ready => true,
                BatchStatus::Calculated => self.settings.recalculate,
                BatchStatus::Confirmed | BatchStatus::Paid => false,
            };

        let (batch, calculation) = if should_calculate {
            let run = self.service.calculate(batch.id, None).await?;
            (self.service.batch(batch.id).await?, Some(run))
        } else {
            (batch, None)
        };

        info!(
            salary_month = %salary_month,
            batch_id = batch.id,
            created,
            calculated = calculation.is_some(),
            status = %batch.status,
            "Scheduled payroll trigger completed"
        );

        Ok(ScheduledRun {
            salary_month,
            batch,
            created,
            calculation,
        })
    }

    /// Spawns the periodic trigger loop.
    ///
    /// Returns `None` when the scheduler is disabled. The first trigger fires
    /// immediately. Trigger errors are logged and the loop keeps running.
    pub fn spawn(self: Arc<Self>) -> Option<SchedulerHandle> {
        if !self.settings.enabled {
            info!("Payroll scheduler disabled");
            return None;
        }

        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let period = Duration::from_secs(self.settings.interval_secs.max(1));

        let task = tokio::spawn(async move {
            info!(interval_secs = period.as_secs(), "Payroll scheduler started");
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.trigger(Utc::now()).await {
                            warn!(error = %e, "Scheduled payroll trigger failed");
                        }
                    }
                    _ = cancel_rx.changed() => {
                        if *cancel_rx.borrow() {
                            info!("Payroll scheduler stopped");
                            break;
                        }
                    }
                }
            }
        });

        Some(SchedulerHandle {
            cancel: cancel_tx,
            task,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::PayrollCalculator;
    use crate::components::PayComponentResolver;
    use crate::config::{BatchConfig, OvertimeConfig};
    use crate::ledger::AdjustmentLedger;
    use crate::models::AttendanceSummary;
    use crate::store::{
        InMemoryApprovalStore, InMemoryAttendanceProvider, InMemoryEmployeeDirectory,
        InMemoryPayComponentStore, InMemoryPayrollRepository,
    };
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn scheduler(settings: SchedulerConfig) -> (PayrollScheduler, Arc<InMemoryAttendanceProvider>) {
        let directory = Arc::new(InMemoryEmployeeDirectory::new());
        directory.insert(1, Decimal::from(2_000_000));
        let attendance = Arc::new(InMemoryAttendanceProvider::new());
        let calculator = PayrollCalculator::new(
            directory.clone(),
            attendance.clone(),
            AdjustmentLedger::new(Arc::new(InMemoryApprovalStore::new())),
            PayComponentResolver::new(Arc::new(InMemoryPayComponentStore::new())),
            OvertimeConfig::default(),
        );
        let service = PayrollBatchService::new(
            Arc::new(InMemoryPayrollRepository::new()),
            calculator,
            directory,
            BatchConfig::default(),
        );
        (PayrollScheduler::new(Arc::new(service), settings), attendance)
    }

    fn march_15() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 2, 0, 0).unwrap()
    }

    #[test]
    fn test_target_month_applies_offset() {
        let (scheduler, _) = scheduler(SchedulerConfig {
            month_offset: -1,
            ..SchedulerConfig::default()
        });
        assert_eq!(scheduler.target_month(march_15()).unwrap().to_string(), "2026-02");
    }

    #[tokio::test]
    async fn test_out_of_range_offset_fails_trigger() {
        let (scheduler, _) = scheduler(SchedulerConfig {
            month_offset: i32::MAX,
            ..SchedulerConfig::default()
        });
        match scheduler.trigger(march_15()).await {
            Err(EngineError::InvalidConfig { field, .. }) => {
                assert_eq!(field, "scheduler.month_offset")
            }
            other => panic!("Expected InvalidConfig, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_trigger_creates_and_calculates() {
        let (scheduler, _) = scheduler(SchedulerConfig::default());

        let run = scheduler.trigger(march_15()).await.unwrap();

        assert!(run.created);
        assert_eq!(run.salary_month.to_string(), "2026-03");
        assert_eq!(run.batch.status, BatchStatus::Calculated);
        // No attendance recorded, so the single employee fails.
        assert_eq!(run.calculation.map(|c| c.failed), Some(1));
    }

    #[tokio::test]
    async fn test_second_trigger_does_not_recalculate_by_default() {
        let (scheduler, _) = scheduler(SchedulerConfig::default());
        scheduler.trigger(march_15()).await.unwrap();

        let run = scheduler.trigger(march_15()).await.unwrap();
        assert!(!run.created);
        assert!(run.calculation.is_none());
    }

    #[tokio::test]
    async fn test_recalculate_picks_up_new_attendance() {
        let (scheduler, attendance) = scheduler(SchedulerConfig {
            recalculate: true,
            ..SchedulerConfig::default()
        });
        scheduler.trigger(march_15()).await.unwrap();

        attendance.insert(
            1,
            SalaryMonth::from_date(march_15().date_naive()),
            AttendanceSummary {
                work_days: 20,
                work_hours: Decimal::from(160),
                overtime_hours: Decimal::ZERO,
            },
        );
        let run = scheduler.trigger(march_15()).await.unwrap();
        assert_eq!(run.calculation.map(|c| c.succeeded), Some(1));
    }

    #[tokio::test]
    async fn test_without_auto_calculate_batch_stays_ready() {
        let (scheduler, _) = scheduler(SchedulerConfig {
            auto_calculate: false,
            ..SchedulerConfig::default()
        });
        let run = scheduler.trigger(march_15()).await.unwrap();
        assert_eq!(run.batch.status, BatchStatus::Ready);
        assert!(run.calculation.is_none());
    }

    #[test]
    fn test_disabled_scheduler_does_not_spawn() {
        let (scheduler, _) = scheduler(SchedulerConfig::default());
        assert!(Arc::new(scheduler).spawn().is_none());
    }

    #[tokio::test]
    async fn test_spawned_loop_triggers_and_stops() {
        let (scheduler, _) = scheduler(SchedulerConfig {
            enabled: true,
            interval_secs: 3600,
            ..SchedulerConfig::default()
        });
        let scheduler = Arc::new(scheduler);
        let service = scheduler.service.clone();

        let handle = scheduler.clone().spawn().unwrap();
        let month = scheduler.target_month(Utc::now()).unwrap();
        let mut found = None;
        for _ in 0..100 {
            found = service.batch_for_month(month).await.unwrap();
            if found.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.stop().await;

        assert!(found.is_some());
    }
}
