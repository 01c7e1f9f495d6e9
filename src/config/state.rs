use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::invoice::Invoice;

/// Invoice book persisted in state.toml
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct State {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invoices: Vec<Invoice>,
    /// Deleted invoices kept for restore, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deleted: Vec<ArchivedInvoice>,
    /// Correspondence log, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<CustomerReply>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ArchivedInvoice {
    pub deleted_at: DateTime<Utc>,
    pub invoice: Invoice,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CustomerReply {
    pub customer_id: String,
    pub message: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

impl State {
    pub fn find(&self, number: &str) -> Option<&Invoice> {
        self.invoices.iter().find(|inv| inv.number == number)
    }

    pub fn find_mut(&mut self, number: &str) -> Option<&mut Invoice> {
        self.invoices.iter_mut().find(|inv| inv.number == number)
    }
}
