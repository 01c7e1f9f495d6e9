mod generator;
mod model;
mod report;

pub use generator::{
    build_line_items, create_invoice, delete_invoice, edit_invoice, restore_invoice, set_status,
};
pub use model::{active_numbers, Invoice, InvoiceStatus, LineItem, Totals};
pub use report::{invoice_stats, sales_report, InvoiceStats, Month, SalesReport};
