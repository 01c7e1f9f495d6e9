//! Profit and margin per customer, joined against product cost.
//!
//! Aggregation is recomputed from scratch on every call and never rounds;
//! formatting is left to the caller.

mod sort;

pub use sort::{filter_clients, sort_clients, SortDirection, SortKey};

use serde::Serialize;
use std::collections::BTreeMap;

use crate::invoice::{Invoice, LineItem};

/// Display name for customers that cannot be resolved
pub const UNKNOWN_CUSTOMER: &str = "Unknown";

/// Purchase price of a product as far as the catalog knows it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CostBasis {
    Known(f64),
    /// No purchase price on record; costed at zero so the whole sale counts
    /// as profit.
    Unknown,
}

impl CostBasis {
    pub fn unit_cost(self) -> f64 {
        match self {
            CostBasis::Known(cost) => cost,
            CostBasis::Unknown => 0.0,
        }
    }
}

/// Grouping key for per-customer rows. `Unknown` sorts after every known id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CustomerKey {
    Known(String),
    Unknown,
}

impl CustomerKey {
    pub fn of(invoice: &Invoice) -> Self {
        match invoice.customer_id.as_deref() {
            Some(id) if !id.is_empty() => CustomerKey::Known(id.to_string()),
            _ => CustomerKey::Unknown,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            CustomerKey::Known(id) => Some(id),
            CustomerKey::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientProfit {
    pub customer: CustomerKey,
    pub customer_name: String,
    pub profit: f64,
    pub invoice_count: usize,
    pub revenue: f64,
    pub margin_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitSummary {
    pub overall_profit: f64,
    pub per_client: Vec<ClientProfit>,
}

pub fn line_profit<C>(item: &LineItem, cost_of: &C) -> f64
where
    C: Fn(&str) -> CostBasis,
{
    let cost = item
        .product_id
        .as_deref()
        .map_or(CostBasis::Unknown, cost_of)
        .unit_cost();
    (item.unit_price - cost) * item.quantity
}

pub fn invoice_profit<C>(invoice: &Invoice, cost_of: &C) -> f64
where
    C: Fn(&str) -> CostBasis,
{
    invoice.items.iter().map(|item| line_profit(item, cost_of)).sum()
}

/// Margin as a percentage of revenue; zero when there is no revenue.
pub fn margin_pct(profit: f64, revenue: f64) -> f64 {
    if revenue > 0.0 {
        profit / revenue * 100.0
    } else {
        0.0
    }
}

#[derive(Default)]
struct Bucket {
    profit: f64,
    invoice_count: usize,
    revenue: f64,
}

/// Compute overall profit and one row per customer.
///
/// `cost_of` maps a product id to its cost basis and `name_of` a customer id
/// to its display name. Rows come out ordered by customer id with the unknown
/// bucket last.
pub fn compute_profit_summary<C, N>(invoices: &[Invoice], cost_of: C, name_of: N) -> ProfitSummary
where
    C: Fn(&str) -> CostBasis,
    N: Fn(&str) -> Option<String>,
{
    let mut overall_profit = 0.0;
    let mut buckets: BTreeMap<CustomerKey, Bucket> = BTreeMap::new();

    for invoice in invoices {
        let profit = invoice_profit(invoice, &cost_of);
        overall_profit += profit;

        let bucket = buckets.entry(CustomerKey::of(invoice)).or_default();
        bucket.profit += profit;
        bucket.invoice_count += 1;
        bucket.revenue += invoice.total_amount;
    }

    let per_client = buckets
        .into_iter()
        .map(|(customer, bucket)| {
            let customer_name = customer
                .id()
                .and_then(&name_of)
                .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string());
            ClientProfit {
                customer_name,
                profit: bucket.profit,
                invoice_count: bucket.invoice_count,
                revenue: bucket.revenue,
                margin_pct: margin_pct(bucket.profit, bucket.revenue),
                customer,
            }
        })
        .collect();

    ProfitSummary {
        overall_profit,
        per_client,
    }
}
