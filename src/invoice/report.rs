use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::model::{Invoice, InvoiceStatus};
use crate::error::BillingError;

/// A calendar month, written YYYY-MM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Month::of(date) == *self
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let first = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .map_err(|_| BillingError::InvalidMonth(s.to_string()))?;
        Ok(Month::of(first))
    }
}

/// Invoices of one month, optionally narrowed to one customer
#[derive(Debug)]
pub struct SalesReport {
    pub month: Month,
    pub customer_id: Option<String>,
    pub invoices: Vec<Invoice>,
    pub total_amount: f64,
    pub paid: f64,
    pub pending: f64,
}

pub fn sales_report(invoices: &[Invoice], month: Month, customer_id: Option<&str>) -> SalesReport {
    let matching: Vec<Invoice> = invoices
        .iter()
        .filter(|inv| month.contains(inv.date))
        .filter(|inv| customer_id.map_or(true, |id| inv.customer_id.as_deref() == Some(id)))
        .cloned()
        .collect();

    let sum_where = |status: InvoiceStatus| -> f64 {
        matching
            .iter()
            .filter(|inv| inv.status == status)
            .map(|inv| inv.total_amount)
            .sum()
    };

    SalesReport {
        month,
        customer_id: customer_id.map(str::to_string),
        total_amount: matching.iter().map(|inv| inv.total_amount).sum(),
        paid: sum_where(InvoiceStatus::Paid),
        pending: sum_where(InvoiceStatus::Pending),
        invoices: matching,
    }
}

impl SalesReport {
    pub fn count(&self) -> usize {
        self.invoices.len()
    }

    /// e.g. sales-report-2026-03-all.csv
    pub fn file_name(&self) -> String {
        let label = match &self.customer_id {
            Some(id) => format!("client-{id}"),
            None => "all".to_string(),
        };
        format!("sales-report-{}-{}.csv", self.month, label)
    }

    /// Render the report as CSV, every field quoted
    pub fn to_csv<F>(&self, name_of: F) -> Result<String, BillingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(Vec::new());
        writer.write_record(["Invoice ID", "Client", "Date", "Due Date", "Status", "Amount"])?;

        for inv in &self.invoices {
            let client = match inv.customer_id.as_deref() {
                Some(id) => name_of(id).unwrap_or_else(|| format!("Customer #{id}")),
                None => "Unknown".to_string(),
            };
            writer.write_record([
                inv.number.clone(),
                client,
                inv.date.to_string(),
                inv.due_date.map(|d| d.to_string()).unwrap_or_default(),
                inv.status.to_string().to_ascii_lowercase(),
                format!("{:.2}", inv.total_amount),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| BillingError::Io(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Counts and sums across invoices
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct InvoiceStats {
    pub count: usize,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
}

pub fn invoice_stats(invoices: &[Invoice]) -> InvoiceStats {
    invoices.iter().fold(InvoiceStats::default(), |acc, inv| InvoiceStats {
        count: acc.count + 1,
        subtotal: acc.subtotal + inv.subtotal,
        tax_amount: acc.tax_amount + inv.tax_amount,
        total_amount: acc.total_amount + inv.total_amount,
    })
}
