use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Config directory not found at {0}. Run 'billsync init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write {path}: {reason}")]
    Serialize { path: PathBuf, reason: String },

    #[error("Invoice number pool was modified by another writer (expected revision {expected}, found {found}). Retry the command.")]
    StalePool { expected: u64, found: u64 },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Customer '{0}' not found in customers.toml")]
    CustomerNotFound(String),

    #[error("Product '{0}' not found in products.toml")]
    ProductNotFound(String),

    #[error("Invalid quantity '{qty}' for product '{product}': {reason}")]
    InvalidQuantity {
        product: String,
        qty: String,
        reason: String,
    },

    #[error("Invalid item format '{0}'. Expected 'product:quantity' (e.g., 'widget:3')")]
    InvalidItemFormat(String),

    #[error("No items specified. Use --item <product>:<quantity> to add line items.")]
    NoItems,

    #[error("Invoice '{0}' not found")]
    InvoiceNotFound(String),

    #[error("Invoice '{0}' not found in deleted invoices")]
    ArchivedInvoiceNotFound(String),

    #[error("Invalid invoice index '{0}'. Use 'billsync list' to see available invoices.")]
    InvalidInvoiceIndex(String),

    #[error("Invoice '{0}' is already active")]
    InvoiceAlreadyActive(String),

    #[error("Paid invoice '{0}' cannot be deleted")]
    PaidInvoiceDelete(String),

    #[error("Reply message cannot be empty")]
    EmptyReply,

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid status '{0}'. Use 'pending', 'paid', 'overdue', or 'cancelled'.")]
    InvalidStatus(String),

    #[error("Invalid sort key '{0}'. Use 'name', 'revenue', 'invoices', 'profit', or 'margin'.")]
    InvalidSortKey(String),

    #[error("Invalid month '{0}'. Expected YYYY-MM (e.g., 2026-03)")]
    InvalidMonth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BillingError>;
