use serde::{Deserialize, Serialize};

/// Creation-timestamp-derived record id (milliseconds since the epoch).
pub type RecordId = i64;

/// Internal category key for salary payouts. Display text comes from the
/// label provider.
pub const SALARY_CATEGORY: &str = "Salary";

pub const DEFAULT_RAW_MATERIALS: &[&str] = &[
    "Bottles (Dirty)",
    "Sacks (Cement)",
    "Caps (Raw)",
    "Packet (Dirty)",
    "Mixed Plastic",
];

pub const DEFAULT_FINISHED_GOODS: &[&str] = &[
    "Flakes (Clean)",
    "Sacks (Clean)",
    "Granule (Cap)",
    "Agglomerate (Packet)",
    "Waste/Trash",
];

pub const DEFAULT_EXPENSE_CATEGORIES: &[&str] = &[
    "Electricity",
    "Water",
    "Gas",
    "Heating",
    "Internet",
    "Phone",
    "Taxes / Patent",
    "Rent",
    "Transport / Delivery",
    "Fuel",
    "Vehicle Maintenance",
    "Food (Lunch)",
    "Equipment Maintenance",
    "Facility Repairs",
    "Office Supplies",
    "Stationery (Pens, Paper)",
    "Cleaning Supplies",
    "Marketing",
    "Advertising",
    "Promotions",
    "Security",
    "Other",
];

pub const DEFAULT_WORKERS: &[&str] = &[
    "Alisher", "Bakhrom", "Farrukh", "Sorter 1", "Sorter 2", "Driver",
];

pub(crate) fn owned_list(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    /// Paid later; income is recognized on the settlement date.
    #[serde(rename = "debt")]
    Deferred,
}

/// A purchase of raw material or a sale of finished goods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: RecordId,
    pub date: String,
    pub time: String,
    #[serde(rename = "type")]
    pub side: TradeSide,
    #[serde(rename = "mat")]
    pub material: String,
    pub qty: f64,
    pub price: f64,
    pub client: String,
    pub method: PaymentMethod,
    /// `qty * price`, fixed at creation.
    pub total: f64,
    pub is_paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_repaid: Option<String>,
}

impl Trade {
    pub fn is_deferred(&self) -> bool {
        self.method == PaymentMethod::Deferred
    }

    /// A deferred sale not yet settled. Only customers owe money.
    pub fn is_outstanding(&self) -> bool {
        self.side == TradeSide::Sell && self.is_deferred() && !self.is_paid
    }
}

/// Conversion of one material into another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Processing {
    pub id: RecordId,
    pub date: String,
    pub time: String,
    pub from: String,
    #[serde(rename = "qtyIn")]
    pub qty_in: f64,
    pub to: String,
    #[serde(rename = "qtyOut")]
    pub qty_out: f64,
}

/// A general expense or a salary payout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: RecordId,
    pub date: String,
    pub time: String,
    #[serde(rename = "cat")]
    pub category: String,
    #[serde(rename = "amt")]
    pub amount: f64,
    /// Free text, or the worker name for salary payouts.
    #[serde(rename = "desc", default)]
    pub description: String,
}

impl Expense {
    pub fn is_salary(&self) -> bool {
        self.category == SALARY_CATEGORY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Trade,
    Processing,
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceList {
    RawMaterials,
    FinishedGoods,
    ExpenseCategories,
    Workers,
}

/// Everything the store persists. Reference lists are cited by records as
/// plain strings, so editing a list never rewrites history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    pub transactions: Vec<Trade>,
    pub processing: Vec<Processing>,
    pub expenses: Vec<Expense>,
    pub raw_materials: Vec<String>,
    pub finished_goods: Vec<String>,
    pub expense_categories: Vec<String>,
    pub workers: Vec<String>,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            transactions: Vec::new(),
            processing: Vec::new(),
            expenses: Vec::new(),
            raw_materials: owned_list(DEFAULT_RAW_MATERIALS),
            finished_goods: owned_list(DEFAULT_FINISHED_GOODS),
            expense_categories: owned_list(DEFAULT_EXPENSE_CATEGORIES),
            workers: owned_list(DEFAULT_WORKERS),
        }
    }
}

impl Database {
    /// Raw materials followed by finished goods.
    pub fn all_materials(&self) -> impl Iterator<Item = &str> {
        self.raw_materials
            .iter()
            .chain(self.finished_goods.iter())
            .map(String::as_str)
    }

    pub fn reference_list(&self, list: ReferenceList) -> &[String] {
        match list {
            ReferenceList::RawMaterials => &self.raw_materials,
            ReferenceList::FinishedGoods => &self.finished_goods,
            ReferenceList::ExpenseCategories => &self.expense_categories,
            ReferenceList::Workers => &self.workers,
        }
    }

    pub(crate) fn reference_list_mut(&mut self, list: ReferenceList) -> &mut Vec<String> {
        match list {
            ReferenceList::RawMaterials => &mut self.raw_materials,
            ReferenceList::FinishedGoods => &mut self.finished_goods,
            ReferenceList::ExpenseCategories => &mut self.expense_categories,
            ReferenceList::Workers => &mut self.workers,
        }
    }

    pub fn contains_id(&self, kind: RecordKind, id: RecordId) -> bool {
        match kind {
            RecordKind::Trade => self.transactions.iter().any(|t| t.id == id),
            RecordKind::Processing => self.processing.iter().any(|p| p.id == id),
            RecordKind::Expense => self.expenses.iter().any(|e| e.id == id),
        }
    }

    pub(crate) fn max_id(&self) -> Option<RecordId> {
        let trades = self.transactions.iter().map(|t| t.id);
        let processing = self.processing.iter().map(|p| p.id);
        let expenses = self.expenses.iter().map(|e| e.id);
        trades.chain(processing).chain(expenses).max()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn trade_serializes_with_stored_field_names() {
        let trade = Trade {
            id: 1709251200000,
            date: "2024-03-01".to_string(),
            time: "09:30".to_string(),
            side: TradeSide::Sell,
            material: "Flakes (Clean)".to_string(),
            qty: 10.0,
            price: 50.0,
            client: "Plastmash".to_string(),
            method: PaymentMethod::Deferred,
            total: 500.0,
            is_paid: false,
            date_repaid: None,
        };

        let value = serde_json::to_value(&trade).unwrap();
        assert_eq!(value["type"], "sell");
        assert_eq!(value["mat"], "Flakes (Clean)");
        assert_eq!(value["method"], "debt");
        assert_eq!(value["is_paid"], false);
        assert!(value.get("date_repaid").is_none());
    }

    #[test]
    fn processing_and_expense_use_short_field_names() {
        let processing: Processing = serde_json::from_str(
            r#"{"id":1,"date":"2024-03-01","time":"10:00","from":"Caps (Raw)","qtyIn":5,"to":"Granule (Cap)","qtyOut":4.5}"#,
        )
        .unwrap();
        assert_eq!(processing.qty_in, 5.0);
        assert_eq!(processing.qty_out, 4.5);

        let expense: Expense = serde_json::from_str(
            r#"{"id":2,"date":"2024-03-01","time":"10:00","cat":"Salary","amt":300}"#,
        )
        .unwrap();
        assert!(expense.is_salary());
        assert_eq!(expense.description, "");
    }

    #[test]
    fn outstanding_requires_deferred_and_unpaid() {
        let mut trade = Trade {
            id: 1,
            date: "2024-03-01".to_string(),
            time: "09:30".to_string(),
            side: TradeSide::Sell,
            material: "Flakes (Clean)".to_string(),
            qty: 1.0,
            price: 1.0,
            client: "A".to_string(),
            method: PaymentMethod::Card,
            total: 1.0,
            is_paid: false,
            date_repaid: None,
        };
        assert!(!trade.is_outstanding());
        trade.method = PaymentMethod::Deferred;
        assert!(trade.is_outstanding());
        trade.is_paid = true;
        assert!(!trade.is_outstanding());

        trade.is_paid = false;
        trade.side = TradeSide::Buy;
        assert!(!trade.is_outstanding());
    }

    #[test]
    fn all_materials_lists_raw_before_finished() {
        let db = Database::default();
        let materials: Vec<&str> = db.all_materials().collect();
        assert_eq!(materials.first(), Some(&"Bottles (Dirty)"));
        assert_eq!(materials.last(), Some(&"Waste/Trash"));
        assert_eq!(materials.len(), 10);
    }
}
