use serde::Serialize;

use crate::model::{Database, TradeSide};
use crate::period::Period;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PeriodTotals {
    pub income: f64,
    pub expense: f64,
    pub profit: f64,
}

/// Cash-realized profit and loss for a period.
///
/// Income is direct (non-deferred) sales dated in the period plus every
/// settlement whose repayment date falls in the period, wherever the
/// original trade is dated. The settlement scan runs over the whole
/// unfiltered trade list.
pub fn summarize(db: &Database, period: &Period) -> PeriodTotals {
    let records = period.select(db);

    let direct_sales: f64 = records
        .trades
        .iter()
        .filter(|t| t.side == TradeSide::Sell && !t.is_deferred())
        .map(|t| t.total)
        .sum();

    let repayments: f64 = db
        .transactions
        .iter()
        .filter(|t| t.side == TradeSide::Sell && t.is_paid)
        .filter(|t| {
            t.date_repaid
                .as_deref()
                .is_some_and(|repaid| period.contains(repaid))
        })
        .map(|t| t.total)
        .sum();

    let purchases: f64 = records
        .trades
        .iter()
        .filter(|t| t.side == TradeSide::Buy)
        .map(|t| t.total)
        .sum();
    let outlays: f64 = records.expenses.iter().map(|e| e.amount).sum();

    log::debug!(
        "period {}: direct sales {direct_sales}, repayments {repayments}, purchases {purchases}, outlays {outlays}",
        period.reference()
    );
    let income = direct_sales + repayments;
    let expense = purchases + outlays;
    PeriodTotals {
        income,
        expense,
        profit: income - expense,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub name: String,
    pub value: f64,
}

/// Sell totals per material within the period, largest first.
pub fn sales_by_material(db: &Database, period: &Period) -> Vec<Breakdown> {
    let records = period.select(db);
    group_descending(
        records
            .trades
            .iter()
            .filter(|t| t.side == TradeSide::Sell)
            .map(|t| (t.material.as_str(), t.total)),
    )
}

/// Expense amounts per category within the period, largest first. Salary
/// payouts group under the internal `Salary` key.
pub fn expenses_by_category(db: &Database, period: &Period) -> Vec<Breakdown> {
    let records = period.select(db);
    group_descending(
        records
            .expenses
            .iter()
            .map(|e| (e.category.as_str(), e.amount)),
    )
}

// First-seen order breaks ties.
fn group_descending<'a>(items: impl Iterator<Item = (&'a str, f64)>) -> Vec<Breakdown> {
    let mut groups: Vec<Breakdown> = Vec::new();
    for (name, value) in items {
        match groups.iter_mut().find(|group| group.name == name) {
            Some(group) => group.value += value,
            None => groups.push(Breakdown {
                name: name.to_string(),
                value,
            }),
        }
    }
    groups.sort_by(|a, b| b.value.total_cmp(&a.value));
    groups
}
