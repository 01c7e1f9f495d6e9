//! Invoice numbering: sequence allocation with reuse of freed numbers.

mod pool;
mod store;

pub use pool::{extract_numeric, format_invoice_number, NumberPool};
pub use store::{PoolStore, FREED_KEY, REVISION_KEY, STORAGE_FILE};
