use std::sync::Arc;

use crate::error::LedgerError;
use crate::model::{
    Database, Expense, PaymentMethod, Processing, RecordId, RecordKind, ReferenceList, Trade,
    TradeSide, SALARY_CATEGORY,
};
use crate::period::EntryStamp;
use crate::stock::project_stock;

/// Input for a new buy or sell.
#[derive(Debug, Clone)]
pub struct TradeDraft {
    pub side: TradeSide,
    pub material: String,
    pub qty: f64,
    pub price: f64,
    pub client: String,
    pub method: PaymentMethod,
}

#[derive(Debug, Clone)]
pub struct ProcessingDraft {
    pub from: String,
    pub qty_in: f64,
    pub to: String,
    pub qty_out: f64,
}

#[derive(Debug, Clone)]
pub enum ExpenseDraft {
    General {
        category: String,
        amount: f64,
        description: String,
    },
    Salary {
        worker: String,
        amount: f64,
    },
}

/// The in-memory record store.
///
/// Every mutation clones the current snapshot, applies the change to the
/// copy, and swaps it in. A caller holding an earlier [`RecordStore::snapshot`]
/// keeps seeing the collection it was handed.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    current: Arc<Database>,
}

impl RecordStore {
    pub fn new(db: Database) -> Self {
        Self {
            current: Arc::new(db),
        }
    }

    pub fn snapshot(&self) -> Arc<Database> {
        Arc::clone(&self.current)
    }

    pub fn database(&self) -> &Database {
        &self.current
    }

    /// Replace the whole collection (restore from backup).
    pub fn replace(&mut self, db: Database) {
        self.current = Arc::new(db);
    }

    fn commit(&mut self, apply: impl FnOnce(&mut Database)) {
        let mut next = Database::clone(&self.current);
        apply(&mut next);
        self.current = Arc::new(next);
    }

    fn next_id(&self, hint: RecordId) -> RecordId {
        match self.current.max_id() {
            Some(max) if max >= hint => max + 1,
            _ => hint,
        }
    }

    /// Record a buy or sell. A buy with no counterparty is attributed to
    /// `default_supplier`.
    pub fn add_trade(
        &mut self,
        draft: TradeDraft,
        stamp: &EntryStamp,
        default_supplier: &str,
    ) -> Result<Trade, LedgerError> {
        let material = require_selection(&draft.material, "material")?;
        require_positive(draft.qty, "quantity")?;
        require_positive(draft.price, "price")?;

        let client = match draft.side {
            TradeSide::Buy => {
                if draft.method == PaymentMethod::Deferred {
                    return Err(LedgerError::DeferredPurchase);
                }
                let client = draft.client.trim();
                if client.is_empty() {
                    default_supplier.to_string()
                } else {
                    client.to_string()
                }
            }
            TradeSide::Sell => {
                let client = require_selection(&draft.client, "client")?;
                let available = project_stock(&self.current).level(&material);
                if draft.qty > available {
                    return Err(LedgerError::InsufficientStock {
                        material,
                        requested: draft.qty,
                        available,
                    });
                }
                client
            }
        };

        let trade = Trade {
            id: self.next_id(stamp.id_hint),
            date: stamp.date.clone(),
            time: stamp.time.clone(),
            side: draft.side,
            material,
            qty: draft.qty,
            price: draft.price,
            client,
            method: draft.method,
            total: draft.qty * draft.price,
            is_paid: draft.method != PaymentMethod::Deferred,
            date_repaid: None,
        };
        log::info!(
            "recorded {:?} {} kg of '{}' for {} ({:?})",
            trade.side,
            trade.qty,
            trade.material,
            trade.total,
            trade.method
        );
        let created = trade.clone();
        self.commit(|db| db.transactions.push(trade));
        Ok(created)
    }

    /// Record a conversion. The source must hold at least `qty_in` now.
    pub fn add_processing(
        &mut self,
        draft: ProcessingDraft,
        stamp: &EntryStamp,
    ) -> Result<Processing, LedgerError> {
        let from = require_selection(&draft.from, "source material")?;
        let to = require_selection(&draft.to, "output material")?;
        require_positive(draft.qty_in, "input quantity")?;
        require_positive(draft.qty_out, "output quantity")?;

        let available = project_stock(&self.current).level(&from);
        if draft.qty_in > available {
            return Err(LedgerError::InsufficientStock {
                material: from,
                requested: draft.qty_in,
                available,
            });
        }

        let processing = Processing {
            id: self.next_id(stamp.id_hint),
            date: stamp.date.clone(),
            time: stamp.time.clone(),
            from,
            qty_in: draft.qty_in,
            to,
            qty_out: draft.qty_out,
        };
        log::info!(
            "recorded conversion {} kg '{}' -> {} kg '{}'",
            processing.qty_in,
            processing.from,
            processing.qty_out,
            processing.to
        );
        let created = processing.clone();
        self.commit(|db| db.processing.push(processing));
        Ok(created)
    }

    pub fn add_expense(
        &mut self,
        draft: ExpenseDraft,
        stamp: &EntryStamp,
    ) -> Result<Expense, LedgerError> {
        let (category, amount, description) = match draft {
            ExpenseDraft::General {
                category,
                amount,
                description,
            } => (
                require_selection(&category, "category")?,
                amount,
                description.trim().to_string(),
            ),
            ExpenseDraft::Salary { worker, amount } => (
                SALARY_CATEGORY.to_string(),
                amount,
                require_selection(&worker, "worker")?,
            ),
        };
        require_positive(amount, "amount")?;

        let expense = Expense {
            id: self.next_id(stamp.id_hint),
            date: stamp.date.clone(),
            time: stamp.time.clone(),
            category,
            amount,
            description,
        };
        log::info!("recorded expense '{}' of {}", expense.category, expense.amount);
        let created = expense.clone();
        self.commit(|db| db.expenses.push(expense));
        Ok(created)
    }

    /// Remove a record. Returns false, leaving the store untouched, when no
    /// record of that kind has the id.
    pub fn delete(&mut self, kind: RecordKind, id: RecordId) -> bool {
        if !self.current.contains_id(kind, id) {
            return false;
        }
        self.commit(|db| match kind {
            RecordKind::Trade => db.transactions.retain(|t| t.id != id),
            RecordKind::Processing => db.processing.retain(|p| p.id != id),
            RecordKind::Expense => db.expenses.retain(|e| e.id != id),
        });
        log::info!("deleted {kind:?} record {id}");
        true
    }

    /// Mark an outstanding deferred trade as paid on `date`. Anything else is
    /// a no-op that returns false.
    pub fn settle(&mut self, id: RecordId, date: &str) -> bool {
        let outstanding = self
            .current
            .transactions
            .iter()
            .any(|t| t.id == id && t.is_outstanding());
        if !outstanding {
            return false;
        }
        self.commit(|db| {
            for trade in db.transactions.iter_mut().filter(|t| t.id == id) {
                trade.is_paid = true;
                trade.date_repaid = Some(date.to_string());
            }
        });
        log::info!("settled deferred trade {id} on {date}");
        true
    }

    /// Append a trimmed name to a reference list. Blank and duplicate names
    /// are ignored.
    pub fn add_reference(&mut self, list: ReferenceList, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.current.reference_list(list).iter().any(|n| n == name) {
            return false;
        }
        self.commit(|db| db.reference_list_mut(list).push(name.to_string()));
        true
    }

    /// Records citing the name keep their copy of it.
    pub fn remove_reference(&mut self, list: ReferenceList, name: &str) -> bool {
        if !self.current.reference_list(list).iter().any(|n| n == name) {
            return false;
        }
        self.commit(|db| db.reference_list_mut(list).retain(|n| n != name));
        true
    }
}

fn require_positive(value: f64, field: &'static str) -> Result<(), LedgerError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LedgerError::NotPositive { field })
    }
}

fn require_selection(value: &str, field: &'static str) -> Result<String, LedgerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(LedgerError::MissingSelection { field })
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn stamp(id_hint: RecordId, date: &str) -> EntryStamp {
        EntryStamp {
            id_hint,
            date: date.to_string(),
            time: "09:00".to_string(),
        }
    }

    fn buy(material: &str, qty: f64, price: f64) -> TradeDraft {
        TradeDraft {
            side: TradeSide::Buy,
            material: material.to_string(),
            qty,
            price,
            client: String::new(),
            method: PaymentMethod::Cash,
        }
    }

    fn sell(material: &str, qty: f64, method: PaymentMethod) -> TradeDraft {
        TradeDraft {
            side: TradeSide::Sell,
            material: material.to_string(),
            qty,
            price: 10.0,
            client: "Plastmash".to_string(),
            method,
        }
    }

    #[test]
    fn buy_defaults_supplier_and_fixes_total() {
        let mut store = RecordStore::default();
        let trade = store
            .add_trade(buy("Bottles (Dirty)", 12.5, 4.0), &stamp(100, "2024-03-15"), "Supplier")
            .unwrap();
        assert_eq!(trade.client, "Supplier");
        assert_eq!(trade.total, 50.0);
        assert!(trade.is_paid);
        assert_eq!(trade.date_repaid, None);
    }

    #[test]
    fn rejects_non_positive_and_nan_amounts() {
        let mut store = RecordStore::default();
        let before = store.database().clone();
        for (qty, price) in [(0.0, 1.0), (-1.0, 1.0), (1.0, 0.0), (f64::NAN, 1.0)] {
            let err = store
                .add_trade(buy("Bottles (Dirty)", qty, price), &stamp(1, "2024-03-15"), "S")
                .unwrap_err();
            assert!(matches!(err, LedgerError::NotPositive { .. }));
        }
        assert_eq!(store.database(), &before);
    }

    #[test]
    fn sell_requires_client_and_stock() {
        let mut store = RecordStore::default();
        let mut draft = sell("Flakes (Clean)", 1.0, PaymentMethod::Cash);
        draft.client = "  ".to_string();
        assert_eq!(
            store.add_trade(draft, &stamp(1, "2024-03-15"), "S").unwrap_err(),
            LedgerError::MissingSelection { field: "client" }
        );

        let err = store
            .add_trade(
                sell("Flakes (Clean)", 1.0, PaymentMethod::Cash),
                &stamp(1, "2024-03-15"),
                "S",
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock { .. }));
        assert!(store.database().transactions.is_empty());
    }

    #[test]
    fn deferred_purchase_is_rejected() {
        let mut store = RecordStore::default();
        let mut draft = buy("Bottles (Dirty)", 100.0, 1.0);
        draft.method = PaymentMethod::Deferred;
        assert_eq!(
            store.add_trade(draft, &stamp(1, "2024-03-01"), "S").unwrap_err(),
            LedgerError::DeferredPurchase
        );
        assert!(store.database().transactions.is_empty());
    }

    #[test]
    fn deferred_sale_starts_unsettled() {
        let mut store = RecordStore::default();
        store
            .add_trade(buy("Flakes (Clean)", 10.0, 1.0), &stamp(1, "2024-03-01"), "S")
            .unwrap();
        let sale = store
            .add_trade(
                sell("Flakes (Clean)", 5.0, PaymentMethod::Deferred),
                &stamp(2, "2024-03-01"),
                "S",
            )
            .unwrap();
        assert!(!sale.is_paid);
        assert!(sale.is_outstanding());
    }

    #[test]
    fn conversion_beyond_stock_is_rejected_without_change() {
        let mut store = RecordStore::default();
        store
            .add_trade(buy("Caps (Raw)", 10.0, 2.0), &stamp(1, "2024-03-01"), "S")
            .unwrap();
        let before = store.database().clone();
        let stock_before = project_stock(store.database());

        let err = store
            .add_processing(
                ProcessingDraft {
                    from: "Caps (Raw)".to_string(),
                    qty_in: 10.5,
                    to: "Granule (Cap)".to_string(),
                    qty_out: 9.0,
                },
                &stamp(2, "2024-03-01"),
            )
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientStock {
                material: "Caps (Raw)".to_string(),
                requested: 10.5,
                available: 10.0,
            }
        );
        assert_eq!(store.database(), &before);
        assert_eq!(project_stock(store.database()), stock_before);
    }

    #[test]
    fn salary_uses_internal_category_and_worker_name() {
        let mut store = RecordStore::default();
        let expense = store
            .add_expense(
                ExpenseDraft::Salary {
                    worker: "Driver".to_string(),
                    amount: 300.0,
                },
                &stamp(1, "2024-03-01"),
            )
            .unwrap();
        assert_eq!(expense.category, SALARY_CATEGORY);
        assert_eq!(expense.description, "Driver");
    }

    #[test]
    fn ids_stay_unique_when_clock_repeats() {
        let mut store = RecordStore::default();
        let first = store
            .add_trade(buy("Caps (Raw)", 1.0, 1.0), &stamp(500, "2024-03-01"), "S")
            .unwrap();
        let second = store
            .add_expense(
                ExpenseDraft::General {
                    category: "Rent".to_string(),
                    amount: 1.0,
                    description: String::new(),
                },
                &stamp(500, "2024-03-01"),
            )
            .unwrap();
        assert_eq!(first.id, 500);
        assert_eq!(second.id, 501);
    }

    #[test]
    fn settle_is_one_way_and_idempotent() {
        let mut store = RecordStore::default();
        store
            .add_trade(buy("Flakes (Clean)", 10.0, 1.0), &stamp(1, "2024-03-01"), "S")
            .unwrap();
        let sale = store
            .add_trade(
                sell("Flakes (Clean)", 5.0, PaymentMethod::Deferred),
                &stamp(2, "2024-03-01"),
                "S",
            )
            .unwrap();

        assert!(store.settle(sale.id, "2024-03-20"));
        let after_first = store.database().clone();
        assert!(!store.settle(sale.id, "2024-03-25"));
        assert_eq!(store.database(), &after_first);
        let settled = &store.database().transactions[1];
        assert!(settled.is_paid);
        assert_eq!(settled.date_repaid.as_deref(), Some("2024-03-20"));

        // Cash trades and unknown ids are not settleable.
        assert!(!store.settle(1, "2024-03-20"));
        assert!(!store.settle(999, "2024-03-20"));
        assert_eq!(store.database(), &after_first);
    }

    #[test]
    fn deleting_missing_id_leaves_store_unchanged() {
        let mut store = RecordStore::default();
        store
            .add_trade(buy("Caps (Raw)", 1.0, 1.0), &stamp(7, "2024-03-01"), "S")
            .unwrap();
        let before = store.snapshot();
        assert!(!store.delete(RecordKind::Trade, 8));
        assert!(!store.delete(RecordKind::Expense, 7));
        assert!(Arc::ptr_eq(&before, &store.snapshot()));

        assert!(store.delete(RecordKind::Trade, 7));
        assert!(store.database().transactions.is_empty());
        assert_eq!(before.transactions.len(), 1);
    }

    #[test]
    fn reference_lists_ignore_blanks_and_duplicates() {
        let mut store = RecordStore::default();
        assert!(store.add_reference(ReferenceList::Workers, "  Sorter 3 "));
        assert!(!store.add_reference(ReferenceList::Workers, "Sorter 3"));
        assert!(!store.add_reference(ReferenceList::Workers, "   "));
        assert_eq!(store.database().workers.last().map(String::as_str), Some("Sorter 3"));

        store
            .add_trade(buy("Caps (Raw)", 1.0, 1.0), &stamp(1, "2024-03-01"), "S")
            .unwrap();
        assert!(store.remove_reference(ReferenceList::RawMaterials, "Caps (Raw)"));
        assert!(!store.remove_reference(ReferenceList::RawMaterials, "Caps (Raw)"));
        assert_eq!(store.database().transactions[0].material, "Caps (Raw)");
    }
}
