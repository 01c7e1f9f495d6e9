//! Per-customer reply log kept alongside the invoice book.

use chrono::Utc;
use std::path::Path;
use tracing::info;

use crate::config::{load_customers, load_state, lock_book, save_state, CustomerReply, State};
use crate::error::{BillingError, Result};

/// Author recorded when none is given
pub const DEFAULT_AUTHOR: &str = "admin";

/// Append a reply to a customer's log
pub fn add_reply(
    cfg_dir: &Path,
    customer_id: &str,
    message: &str,
    author: Option<&str>,
) -> Result<CustomerReply> {
    let customers = load_customers(cfg_dir)?;
    if !customers.contains_key(customer_id) {
        return Err(BillingError::CustomerNotFound(customer_id.to_string()));
    }

    let message = message.trim();
    if message.is_empty() {
        return Err(BillingError::EmptyReply);
    }

    let reply = CustomerReply {
        customer_id: customer_id.to_string(),
        message: message.to_string(),
        author: author
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_AUTHOR)
            .to_string(),
        created_at: Utc::now(),
    };

    let _lock = lock_book(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;
    state.replies.push(reply.clone());
    save_state(cfg_dir, &state)?;

    info!(customer = customer_id, author = %reply.author, "reply recorded");
    Ok(reply)
}

/// A customer's replies, newest first
pub fn replies_for<'a>(state: &'a State, customer_id: &str) -> Vec<&'a CustomerReply> {
    let mut replies: Vec<&CustomerReply> = state
        .replies
        .iter()
        .rev()
        .filter(|r| r.customer_id == customer_id)
        .collect();
    replies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    replies
}
