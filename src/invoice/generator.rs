use chrono::{Local, Utc};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use super::model::{active_numbers, Invoice, InvoiceStatus, LineItem, Totals};
use crate::config::{
    load_config, load_customers, load_products, load_state, lock_book, save_state, ArchivedInvoice,
    Product,
};
use crate::error::{BillingError, Result};
use crate::numbering::{extract_numeric, format_invoice_number, PoolStore};

/// Parse item input like "widget:3" into (product_id, quantity)
fn parse_item_input(input: &str) -> Result<(&str, f64)> {
    let Some((product_id, qty_str)) = input.split_once(':') else {
        return Err(BillingError::InvalidItemFormat(input.to_string()));
    };
    if product_id.is_empty() || qty_str.contains(':') {
        return Err(BillingError::InvalidItemFormat(input.to_string()));
    }

    let quantity: f64 = qty_str.parse().map_err(|_| BillingError::InvalidQuantity {
        product: product_id.to_string(),
        qty: qty_str.to_string(),
        reason: "must be a number".to_string(),
    })?;

    if !quantity.is_finite() || quantity < 0.0 {
        return Err(BillingError::InvalidQuantity {
            product: product_id.to_string(),
            qty: qty_str.to_string(),
            reason: "must not be negative".to_string(),
        });
    }

    Ok((product_id, quantity))
}

/// Price item inputs against the product catalog
pub fn build_line_items(
    items_input: &[String],
    catalog: &BTreeMap<String, Product>,
) -> Result<Vec<LineItem>> {
    if items_input.is_empty() {
        return Err(BillingError::NoItems);
    }

    items_input
        .iter()
        .map(|input| {
            let (product_id, quantity) = parse_item_input(input)?;
            let product = catalog
                .get(product_id)
                .ok_or_else(|| BillingError::ProductNotFound(product_id.to_string()))?;
            Ok(LineItem::new(
                Some(product_id.to_string()),
                product.name.clone(),
                quantity,
                product.price,
            ))
        })
        .collect()
}

/// Create a new invoice, taking its number from the pool
pub fn create_invoice(
    cfg_dir: &Path,
    customer_id: &str,
    items_input: &[String],
    status: InvoiceStatus,
    notes: Option<String>,
) -> Result<Invoice> {
    let config = load_config(cfg_dir)?;
    let customers = load_customers(cfg_dir)?;
    let catalog = load_products(cfg_dir)?;

    if !customers.contains_key(customer_id) {
        return Err(BillingError::CustomerNotFound(customer_id.to_string()));
    }

    let items = build_line_items(items_input, &catalog)?;
    let totals = Totals::from_items(&items, config.invoice.tax_rate);

    let _lock = lock_book(cfg_dir)?;
    let (mut store, mut pool) = PoolStore::open(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;

    // The number is committed before the invoice is saved and handed back if
    // saving fails.
    let seq = pool.next_number(&active_numbers(&state.invoices));
    store.commit(&pool)?;
    let number = format_invoice_number(&config.invoice.prefix, config.invoice.number_width, seq);

    let today = Local::now().date_naive();
    let due_date = today.checked_add_signed(chrono::Duration::days(config.invoice.due_days as i64));

    let mut invoice = Invoice {
        number,
        customer_id: Some(customer_id.to_string()),
        date: today,
        due_date,
        subtotal: 0.0,
        tax_amount: 0.0,
        total_amount: 0.0,
        status,
        notes,
        items,
    };
    invoice.apply_totals(totals);

    state.invoices.push(invoice.clone());
    if let Err(e) = save_state(cfg_dir, &state) {
        warn!(number = seq, error = %e, "invoice not saved, returning number to pool");
        pool.release(seq);
        if let Err(release_err) = store.commit(&pool) {
            warn!(number = seq, error = %release_err, "failed to return number to pool");
        }
        return Err(e);
    }

    info!(
        invoice = %invoice.number,
        customer = customer_id,
        total = invoice.total_amount,
        "invoice created"
    );
    Ok(invoice)
}

/// Replace an invoice's line items and recompute its totals
pub fn edit_invoice(cfg_dir: &Path, invoice_number: &str, items_input: &[String]) -> Result<Invoice> {
    let config = load_config(cfg_dir)?;
    let catalog = load_products(cfg_dir)?;

    let items = build_line_items(items_input, &catalog)?;
    let totals = Totals::from_items(&items, config.invoice.tax_rate);

    let _lock = lock_book(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;
    let invoice = state
        .find_mut(invoice_number)
        .ok_or_else(|| BillingError::InvoiceNotFound(invoice_number.to_string()))?;
    invoice.items = items;
    invoice.apply_totals(totals);
    let updated = invoice.clone();

    save_state(cfg_dir, &state)?;
    info!(invoice = invoice_number, total = updated.total_amount, "invoice items updated");
    Ok(updated)
}

pub fn set_status(cfg_dir: &Path, invoice_number: &str, status: InvoiceStatus) -> Result<Invoice> {
    let _lock = lock_book(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;

    let invoice = state
        .find_mut(invoice_number)
        .ok_or_else(|| BillingError::InvoiceNotFound(invoice_number.to_string()))?;
    let previous = invoice.status;
    invoice.status = status;
    let updated = invoice.clone();

    save_state(cfg_dir, &state)?;
    info!(invoice = invoice_number, from = %previous, to = %status, "invoice status changed");
    Ok(updated)
}

/// Move an invoice into the deleted archive and free its number
pub fn delete_invoice(cfg_dir: &Path, invoice_number: &str) -> Result<ArchivedInvoice> {
    let _lock = lock_book(cfg_dir)?;
    let (mut store, mut pool) = PoolStore::open(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;

    let idx = state
        .invoices
        .iter()
        .position(|inv| inv.number == invoice_number)
        .ok_or_else(|| BillingError::InvoiceNotFound(invoice_number.to_string()))?;

    if state.invoices[idx].status == InvoiceStatus::Paid {
        return Err(BillingError::PaidInvoiceDelete(invoice_number.to_string()));
    }

    let invoice = state.invoices.remove(idx);
    let seq = invoice.sequence();
    let archived = ArchivedInvoice {
        deleted_at: Utc::now(),
        invoice,
    };
    state.deleted.push(archived.clone());

    // Freed first: a failed save takes the number back and leaves the invoice active.
    if let Some(n) = seq {
        pool.release(n);
        store.commit(&pool)?;
    }

    if let Err(e) = save_state(cfg_dir, &state) {
        if let Some(n) = seq {
            warn!(number = n, error = %e, "delete not saved, taking number back from pool");
            pool.reserve(n);
            if let Err(reserve_err) = store.commit(&pool) {
                warn!(number = n, error = %reserve_err, "failed to take number back from pool");
            }
        }
        return Err(e);
    }

    info!(invoice = invoice_number, "invoice deleted and archived");
    Ok(archived)
}

/// Bring an archived invoice back under its original number
pub fn restore_invoice(cfg_dir: &Path, invoice_number: &str) -> Result<Invoice> {
    let config = load_config(cfg_dir)?;

    let _lock = lock_book(cfg_dir)?;
    let (mut store, mut pool) = PoolStore::open(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;

    let idx = state
        .deleted
        .iter()
        .rposition(|a| a.invoice.number == invoice_number)
        .ok_or_else(|| BillingError::ArchivedInvoiceNotFound(invoice_number.to_string()))?;

    let seq = extract_numeric(invoice_number);
    let taken = match seq {
        Some(n) => active_numbers(&state.invoices).contains(&n),
        None => false,
    };
    if taken || state.find(invoice_number).is_some() {
        return Err(BillingError::InvoiceAlreadyActive(invoice_number.to_string()));
    }

    if let Some(n) = seq {
        pool.reserve(n);
        store.commit(&pool)?;
    }

    let mut invoice = state.deleted.remove(idx).invoice;
    for item in &mut invoice.items {
        item.total_price = item.unit_price * item.quantity;
    }
    invoice.apply_totals(Totals::from_items(&invoice.items, config.invoice.tax_rate));
    invoice.status = InvoiceStatus::Pending;

    state.invoices.push(invoice.clone());
    if let Err(e) = save_state(cfg_dir, &state) {
        if let Some(n) = seq {
            warn!(number = n, error = %e, "restore not saved, freeing number again");
            pool.release(n);
            if let Err(release_err) = store.commit(&pool) {
                warn!(number = n, error = %release_err, "failed to free number");
            }
        }
        return Err(e);
    }

    info!(invoice = invoice_number, "invoice restored");
    Ok(invoice)
}
