//! Stock levels across the product catalog.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StockLevel {
    InStock,
    /// Above zero but at or below the product's minimum level
    Low,
    Out,
}

impl Product {
    /// `None` for products that carry no stock figure
    pub fn stock_level(&self) -> Option<StockLevel> {
        let stock = self.stock_quantity?;
        Some(if stock <= 0.0 {
            StockLevel::Out
        } else if stock <= self.min_stock_level {
            StockLevel::Low
        } else {
            StockLevel::InStock
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockRow {
    pub product_id: String,
    pub name: String,
    pub category: Option<String>,
    pub stock_quantity: f64,
    pub min_stock_level: f64,
}

impl StockRow {
    /// Stock on hand relative to the minimum level
    pub fn ratio(&self) -> f64 {
        self.stock_quantity / self.min_stock_level
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StockReport {
    /// Most urgent first
    pub low: Vec<StockRow>,
    /// By product id
    pub out: Vec<StockRow>,
    /// Products with no stock figure
    pub untracked: usize,
}

impl StockReport {
    pub fn needs_attention(&self) -> bool {
        !self.low.is_empty() || !self.out.is_empty()
    }
}

pub fn stock_report(catalog: &BTreeMap<String, Product>) -> StockReport {
    let mut report = StockReport::default();

    for (id, product) in catalog {
        let Some(level) = product.stock_level() else {
            report.untracked += 1;
            continue;
        };
        let row = StockRow {
            product_id: id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            stock_quantity: product.stock_quantity.unwrap_or_default(),
            min_stock_level: product.min_stock_level,
        };
        match level {
            StockLevel::Low => report.low.push(row),
            StockLevel::Out => report.out.push(row),
            StockLevel::InStock => {}
        }
    }

    // Low rows always have a positive minimum level, so the ratio is finite.
    report.low.sort_by(|a, b| a.ratio().total_cmp(&b.ratio()));
    report
}
