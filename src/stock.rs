use std::collections::HashMap;

use crate::model::{Database, TradeSide};

/// On-hand quantity (kg) per material, in encounter order: raw materials,
/// finished goods, then any other material a record names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockMap {
    levels: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl StockMap {
    fn seed(&mut self, material: &str) -> usize {
        if let Some(&position) = self.index.get(material) {
            return position;
        }
        let position = self.levels.len();
        self.levels.push((material.to_string(), 0.0));
        self.index.insert(material.to_string(), position);
        position
    }

    fn adjust(&mut self, material: &str, delta: f64) {
        let position = self.seed(material);
        self.levels[position].1 += delta;
    }

    /// Unknown materials have nothing on hand.
    pub fn level(&self, material: &str) -> f64 {
        self.index
            .get(material)
            .map(|&position| self.levels[position].1)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.levels.iter().map(|(name, qty)| (name.as_str(), *qty))
    }

    pub fn positive(&self) -> impl Iterator<Item = (&str, f64)> {
        self.iter().filter(|(_, qty)| *qty > 0.0)
    }

    /// Materials driven below zero; only reachable when records bypass the
    /// entry checks (hand-edited store, restored backup).
    pub fn shortages(&self) -> impl Iterator<Item = (&str, f64)> {
        self.iter().filter(|(_, qty)| *qty < 0.0)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Fold the full trade and processing history into stock levels.
pub fn project_stock(db: &Database) -> StockMap {
    let mut stock = StockMap::default();
    for material in db.all_materials() {
        stock.seed(material);
    }

    for trade in &db.transactions {
        match trade.side {
            TradeSide::Buy => stock.adjust(&trade.material, trade.qty),
            TradeSide::Sell => stock.adjust(&trade.material, -trade.qty),
        }
    }

    for processing in &db.processing {
        stock.adjust(&processing.from, -processing.qty_in);
        stock.adjust(&processing.to, processing.qty_out);
    }

    log::debug!(
        "projected stock for {} materials from {} trades and {} conversions",
        stock.len(),
        db.transactions.len(),
        db.processing.len()
    );
    stock
}
