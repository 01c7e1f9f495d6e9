use serde::{Deserialize, Serialize};

use crate::profit::CostBasis;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Product {
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Unit sale price
    pub price: f64,
    /// Unit purchase price; absent when the cost is not known
    #[serde(default)]
    pub purchase_price: Option<f64>,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Units on hand; products without it are not stock-tracked
    #[serde(default)]
    pub stock_quantity: Option<f64>,
    /// Stock at or below this level counts as low
    #[serde(default = "default_min_stock_level")]
    pub min_stock_level: f64,
}

impl Product {
    pub fn cost_basis(&self) -> CostBasis {
        match self.purchase_price {
            Some(cost) => CostBasis::Known(cost),
            None => CostBasis::Unknown,
        }
    }
}

fn default_unit() -> String {
    "piece".to_string()
}

fn default_min_stock_level() -> f64 {
    10.0
}
