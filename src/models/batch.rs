//! Payroll batch model and its lifecycle state machine.
//!
//! A [`PayrollBatch`] is one month's payroll run. Its [`BatchStatus`] only
//! ever moves forward:
//!
//! ```text
//! READY --mark_calculated--> CALCULATED --confirm--> CONFIRMED --mark_paid--> PAID
//! ```
//!
//! Every transition is computed by [`BatchStatus::next`] before anything is
//! written, so a rejected transition leaves the batch untouched.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SalaryMonth;
use crate::error::{EngineError, EngineResult};

/// Identifier of a payroll batch.
pub type BatchId = u64;

/// Lifecycle status of a payroll batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    /// Created, results may be (re)calculated.
    Ready,
    /// Results recorded; may still be recalculated.
    Calculated,
    /// Numbers locked for payment.
    Confirmed,
    /// Payment emitted. Terminal.
    Paid,
}

/// A lifecycle transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchAction {
    /// READY -> CALCULATED.
    MarkCalculated,
    /// CALCULATED -> CONFIRMED.
    Confirm,
    /// CONFIRMED -> PAID.
    MarkPaid,
}

impl BatchStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [BatchStatus; 4] = [
        BatchStatus::Ready,
        BatchStatus::Calculated,
        BatchStatus::Confirmed,
        BatchStatus::Paid,
    ];

    /// Returns the status reached by applying `action`, or `None` if the
    /// action is not legal from this status.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::{BatchAction, BatchStatus};
    ///
    /// assert_eq!(
    ///     BatchStatus::Ready.next(BatchAction::MarkCalculated),
    ///     Some(BatchStatus::Calculated)
    /// );
    /// assert_eq!(BatchStatus::Ready.next(BatchAction::Confirm), None);
    /// ```
    pub fn next(self, action: BatchAction) -> Option<BatchStatus> {
        match (self, action) {
            (BatchStatus::Ready, BatchAction::MarkCalculated) => Some(BatchStatus::Calculated),
            (BatchStatus::Calculated, BatchAction::Confirm) => Some(BatchStatus::Confirmed),
            (BatchStatus::Confirmed, BatchAction::MarkPaid) => Some(BatchStatus::Paid),
            _ => None,
        }
    }

    /// True once results are frozen (CONFIRMED or PAID).
    pub fn is_locked(self) -> bool {
        matches!(self, BatchStatus::Confirmed | BatchStatus::Paid)
    }

    /// Position in the lifecycle, starting at 0 for READY.
    pub fn rank(self) -> u8 {
        match self {
            BatchStatus::Ready => 0,
            BatchStatus::Calculated => 1,
            BatchStatus::Confirmed => 2,
            BatchStatus::Paid => 3,
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchStatus::Ready => "READY",
            BatchStatus::Calculated => "CALCULATED",
            BatchStatus::Confirmed => "CONFIRMED",
            BatchStatus::Paid => "PAID",
        };
        f.write_str(name)
    }
}

impl BatchAction {
    /// All actions.
    pub const ALL: [BatchAction; 3] = [
        BatchAction::MarkCalculated,
        BatchAction::Confirm,
        BatchAction::MarkPaid,
    ];
}

impl fmt::Display for BatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchAction::MarkCalculated => "mark calculated",
            BatchAction::Confirm => "confirm",
            BatchAction::MarkPaid => "mark paid",
        };
        f.write_str(name)
    }
}

/// One month's payroll run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollBatch {
    /// Batch identifier.
    pub id: BatchId,
    /// The month this batch pays. Unique across batches.
    pub salary_month: SalaryMonth,
    /// Current lifecycle status.
    pub status: BatchStatus,
    /// When the batch was created.
    pub created_at: DateTime<Utc>,
    /// When the status last changed.
    pub updated_at: DateTime<Utc>,
    /// When the batch was confirmed.
    pub confirmed_at: Option<DateTime<Utc>>,
    /// When payment was emitted.
    pub closed_at: Option<DateTime<Utc>>,
}

impl PayrollBatch {
    /// Creates a batch in READY.
    pub fn new(id: BatchId, salary_month: SalaryMonth, now: DateTime<Utc>) -> Self {
        Self {
            id,
            salary_month,
            status: BatchStatus::Ready,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            closed_at: None,
        }
    }

    fn next_status(&self, action: BatchAction) -> EngineResult<BatchStatus> {
        self.status
            .next(action)
            .ok_or(EngineError::InvalidTransition {
                batch_id: self.id,
                from: self.status,
                action,
            })
    }

    /// READY -> CALCULATED. Fails for an empty batch.
    pub fn mark_calculated(&mut self, result_count: usize, now: DateTime<Utc>) -> EngineResult<()> {
        let next = self.next_status(BatchAction::MarkCalculated)?;
        if result_count == 0 {
            return Err(EngineError::EmptyBatch { batch_id: self.id });
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// CALCULATED -> CONFIRMED, stamping `confirmed_at`.
    pub fn confirm(&mut self, now: DateTime<Utc>) -> EngineResult<()> {
        let next = self.next_status(BatchAction::Confirm)?;
        self.status = next;
        self.confirmed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// CONFIRMED -> PAID, stamping `closed_at`.
    pub fn mark_paid(&mut self, now: DateTime<Utc>) -> EngineResult<()> {
        let next = self.next_status(BatchAction::MarkPaid)?;
        self.status = next;
        self.closed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Fails with `BatchLocked` once results are frozen.
    pub fn ensure_recalculable(&self) -> EngineResult<()> {
        if self.status.is_locked() {
            return Err(EngineError::BatchLocked {
                batch_id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn create_test_batch() -> PayrollBatch {
        PayrollBatch::new(1, SalaryMonth::from_str("2025-12").unwrap(), Utc::now())
    }

    fn batch_in(status: BatchStatus) -> PayrollBatch {
        let mut batch = create_test_batch();
        batch.status = status;
        batch
    }

    fn apply(batch: &mut PayrollBatch, action: BatchAction) -> EngineResult<()> {
        let now = Utc::now();
        match action {
            BatchAction::MarkCalculated => batch.mark_calculated(1, now),
            BatchAction::Confirm => batch.confirm(now),
            BatchAction::MarkPaid => batch.mark_paid(now),
        }
    }

    #[test]
    fn test_new_batch_is_ready() {
        let batch = create_test_batch();
        assert_eq!(batch.status, BatchStatus::Ready);
        assert!(batch.confirmed_at.is_none());
        assert!(batch.closed_at.is_none());
    }

    #[test]
    fn test_full_lifecycle() {
        let mut batch = create_test_batch();

        batch.mark_calculated(3, Utc::now()).unwrap();
        assert_eq!(batch.status, BatchStatus::Calculated);

        batch.confirm(Utc::now()).unwrap();
        assert_eq!(batch.status, BatchStatus::Confirmed);
        assert!(batch.confirmed_at.is_some());

        batch.mark_paid(Utc::now()).unwrap();
        assert_eq!(batch.status, BatchStatus::Paid);
        assert!(batch.closed_at.is_some());
    }

    #[test]
    fn test_every_invalid_transition_is_rejected_and_leaves_batch_unchanged() {
        let mut rejected = 0;
        for status in BatchStatus::ALL {
            for action in BatchAction::ALL {
                if status.next(action).is_some() {
                    continue;
                }
                let mut batch = batch_in(status);
                let before = batch.clone();

                match apply(&mut batch, action) {
                    Err(EngineError::InvalidTransition {
                        batch_id,
                        from,
                        action: attempted,
                    }) => {
                        assert_eq!(batch_id, 1);
                        assert_eq!(from, status);
                        assert_eq!(attempted, action);
                    }
                    other => panic!("Expected InvalidTransition for {status} / {action}, got {other:?}"),
                }
                assert_eq!(batch, before);
                rejected += 1;
            }
        }
        assert_eq!(rejected, 9);
    }

    #[test]
    fn test_confirm_from_ready_fails() {
        let mut batch = create_test_batch();
        assert!(batch.confirm(Utc::now()).is_err());
        assert_eq!(batch.status, BatchStatus::Ready);
    }

    #[test]
    fn test_mark_paid_from_calculated_fails() {
        let mut batch = batch_in(BatchStatus::Calculated);
        assert!(batch.mark_paid(Utc::now()).is_err());
        assert_eq!(batch.status, BatchStatus::Calculated);
        assert!(batch.closed_at.is_none());
    }

    #[test]
    fn test_mark_calculated_rejects_empty_batch() {
        let mut batch = create_test_batch();
        match batch.mark_calculated(0, Utc::now()) {
            Err(EngineError::EmptyBatch { batch_id }) => assert_eq!(batch_id, 1),
            other => panic!("Expected EmptyBatch, got {:?}", other),
        }
        assert_eq!(batch.status, BatchStatus::Ready);
    }

    #[test]
    fn test_mark_calculated_from_wrong_state_reports_transition_before_emptiness() {
        let mut batch = batch_in(BatchStatus::Confirmed);
        assert!(matches!(
            batch.mark_calculated(0, Utc::now()),
            Err(EngineError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_ensure_recalculable() {
        assert!(batch_in(BatchStatus::Ready).ensure_recalculable().is_ok());
        assert!(batch_in(BatchStatus::Calculated).ensure_recalculable().is_ok());
        for status in [BatchStatus::Confirmed, BatchStatus::Paid] {
            match batch_in(status).ensure_recalculable() {
                Err(EngineError::BatchLocked { status: s, .. }) => assert_eq!(s, status),
                other => panic!("Expected BatchLocked, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        assert_eq!(
            serde_json::to_string(&BatchStatus::Calculated).unwrap(),
            "\"CALCULATED\""
        );
        let status: BatchStatus = serde_json::from_str("\"PAID\"").unwrap();
        assert_eq!(status, BatchStatus::Paid);
    }

    #[test]
    fn test_rank_is_monotonic_along_transitions() {
        for status in BatchStatus::ALL {
            for action in BatchAction::ALL {
                if let Some(next) = status.next(action) {
                    assert_eq!(next.rank(), status.rank() + 1);
                }
            }
        }
    }
}
