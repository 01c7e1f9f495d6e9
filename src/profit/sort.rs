use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::ClientProfit;
use crate::error::BillingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    Name,
    Revenue,
    Invoices,
    #[default]
    Profit,
    Margin,
}

impl FromStr for SortKey {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "revenue" => Ok(SortKey::Revenue),
            "invoices" | "count" => Ok(SortKey::Invoices),
            "profit" => Ok(SortKey::Profit),
            "margin" => Ok(SortKey::Margin),
            _ => Err(BillingError::InvalidSortKey(s.to_string())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortKey::Name => "name",
            SortKey::Revenue => "revenue",
            SortKey::Invoices => "invoices",
            SortKey::Profit => "profit",
            SortKey::Margin => "margin",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

fn compare(a: &ClientProfit, b: &ClientProfit, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a
            .customer_name
            .to_lowercase()
            .cmp(&b.customer_name.to_lowercase()),
        SortKey::Revenue => a.revenue.total_cmp(&b.revenue),
        SortKey::Invoices => a.invoice_count.cmp(&b.invoice_count),
        SortKey::Profit => a.profit.total_cmp(&b.profit),
        SortKey::Margin => a.margin_pct.total_cmp(&b.margin_pct),
    }
}

/// Order rows for display. Ties keep their incoming order.
pub fn sort_clients(rows: &mut [ClientProfit], key: SortKey, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let ord = compare(a, b, key);
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
}

/// Keep rows whose customer name contains `query`, ignoring case
pub fn filter_clients(rows: Vec<ClientProfit>, query: &str) -> Vec<ClientProfit> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|row| row.customer_name.to_lowercase().contains(&query))
        .collect()
}
