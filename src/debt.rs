use chrono::NaiveDate;

use crate::model::{Database, RecordId, Trade};
use crate::period::Period;
use crate::store::RecordStore;

/// Yes/no gate in front of destructive operations.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Answers every prompt the same way.
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    Settled,
    Declined,
    NotOutstanding,
}

/// Deferred trades not yet settled, in encounter order.
pub fn outstanding(db: &Database) -> Vec<&Trade> {
    db.transactions
        .iter()
        .filter(|t| t.is_outstanding())
        .collect()
}

pub fn outstanding_total(db: &Database) -> f64 {
    outstanding(db).iter().map(|t| t.total).sum()
}

/// Settle a deferred trade after confirmation. The repayment date follows
/// the active period: the reference day in day view, `today` in month view.
pub fn settle(
    store: &mut RecordStore,
    id: RecordId,
    period: &Period,
    today: NaiveDate,
    confirm: &mut dyn Confirm,
    prompt: &str,
) -> SettleOutcome {
    let is_outstanding = store
        .database()
        .transactions
        .iter()
        .any(|t| t.id == id && t.is_outstanding());
    if !is_outstanding {
        return SettleOutcome::NotOutstanding;
    }
    if !confirm.confirm(prompt) {
        return SettleOutcome::Declined;
    }
    if store.settle(id, &period.entry_date(today)) {
        SettleOutcome::Settled
    } else {
        SettleOutcome::NotOutstanding
    }
}
