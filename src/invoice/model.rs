use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::BillingError;
use crate::numbering::extract_numeric;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Overdue => "OVERDUE",
            InvoiceStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

impl FromStr for InvoiceStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            "cancelled" | "canceled" => Ok(InvoiceStatus::Cancelled),
            _ => Err(BillingError::InvalidStatus(s.to_string())),
        }
    }
}

/// A line on the invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub product_name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_price: f64,
}

impl LineItem {
    pub fn new(product_id: Option<String>, product_name: String, quantity: f64, unit_price: f64) -> Self {
        Self {
            product_id,
            product_name,
            quantity,
            unit_price,
            total_price: unit_price * quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Human-facing label, e.g. INV-0000000042
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub subtotal: f64,
    #[serde(default)]
    pub tax_amount: f64,
    pub total_amount: f64,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<LineItem>,
}

impl Invoice {
    /// Sequence number parsed from the label
    pub fn sequence(&self) -> Option<u64> {
        extract_numeric(&self.number)
    }

    pub fn apply_totals(&mut self, totals: Totals) {
        self.subtotal = totals.subtotal;
        self.tax_amount = totals.tax_amount;
        self.total_amount = totals.total_amount;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
}

impl Totals {
    pub fn from_items(items: &[LineItem], tax_rate: f64) -> Self {
        let subtotal: f64 = items.iter().map(|i| i.total_price).sum();
        let tax_amount = subtotal * tax_rate;
        Self {
            subtotal,
            tax_amount,
            total_amount: subtotal + tax_amount,
        }
    }
}

/// Sequence numbers held by the given invoices
pub fn active_numbers(invoices: &[Invoice]) -> HashSet<u64> {
    invoices.iter().filter_map(Invoice::sequence).collect()
}
